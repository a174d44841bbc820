//! Build constraint evaluation.
//!
//! A Go file takes part in a build only if its name suffix (`_linux.go`,
//! `_windows_arm64.go`) and its build constraint comments are satisfied by
//! the [`BuildContext`]. Both `//go:build` expressions and legacy
//! `// +build` lines are understood; when a file carries both, the
//! `//go:build` line wins.

use thiserror::Error;

use super::scan::{constraint_lines, leading_comments};
use crate::context::BuildContext;
use crate::platform::arch::is_known_arch;
use crate::platform::os::is_known_os;

/// Errors in build constraint syntax.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstraintError {
  #[error("invalid //go:build expression '{expr}': {reason}")]
  Syntax { expr: String, reason: String },

  #[error("multiple //go:build lines")]
  MultipleGoBuild,
}

/// Parsed `//go:build` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
  Tag(String),
  Not(Box<Expr>),
  And(Box<Expr>, Box<Expr>),
  Or(Box<Expr>, Box<Expr>),
}

impl Expr {
  /// Parse the text following `//go:build`.
  pub fn parse(text: &str) -> Result<Self, ConstraintError> {
    let tokens = tokenize(text).map_err(|reason| ConstraintError::Syntax {
      expr: text.to_string(),
      reason,
    })?;
    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.or().map_err(|reason| ConstraintError::Syntax {
      expr: text.to_string(),
      reason,
    })?;
    if parser.pos != parser.tokens.len() {
      return Err(ConstraintError::Syntax {
        expr: text.to_string(),
        reason: format!("unexpected '{}'", parser.tokens[parser.pos]),
      });
    }
    Ok(expr)
  }

  pub fn eval(&self, ctx: &BuildContext) -> bool {
    match self {
      Expr::Tag(tag) => ctx.matches_tag(tag),
      Expr::Not(inner) => !inner.eval(ctx),
      Expr::And(a, b) => a.eval(ctx) && b.eval(ctx),
      Expr::Or(a, b) => a.eval(ctx) || b.eval(ctx),
    }
  }
}

fn tokenize(text: &str) -> Result<Vec<String>, String> {
  let mut tokens = Vec::new();
  let mut chars = text.chars().peekable();
  while let Some(c) = chars.next() {
    match c {
      ' ' | '\t' => {}
      '(' | ')' | '!' => tokens.push(c.to_string()),
      '&' | '|' => {
        if chars.next() != Some(c) {
          return Err(format!("expected '{c}{c}'"));
        }
        tokens.push(format!("{c}{c}"));
      }
      c if is_tag_char(c) => {
        let mut tag = c.to_string();
        while let Some(&next) = chars.peek() {
          if !is_tag_char(next) {
            break;
          }
          tag.push(next);
          chars.next();
        }
        tokens.push(tag);
      }
      other => return Err(format!("invalid character '{other}'")),
    }
  }
  if tokens.is_empty() {
    return Err("empty expression".to_string());
  }
  Ok(tokens)
}

fn is_tag_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '.'
}

struct ExprParser {
  tokens: Vec<String>,
  pos: usize,
}

impl ExprParser {
  fn peek(&self) -> Option<&str> {
    self.tokens.get(self.pos).map(String::as_str)
  }

  fn or(&mut self) -> Result<Expr, String> {
    let mut left = self.and()?;
    while self.peek() == Some("||") {
      self.pos += 1;
      let right = self.and()?;
      left = Expr::Or(Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  fn and(&mut self) -> Result<Expr, String> {
    let mut left = self.not()?;
    while self.peek() == Some("&&") {
      self.pos += 1;
      let right = self.not()?;
      left = Expr::And(Box::new(left), Box::new(right));
    }
    Ok(left)
  }

  fn not(&mut self) -> Result<Expr, String> {
    if self.peek() == Some("!") {
      self.pos += 1;
      return Ok(Expr::Not(Box::new(self.not()?)));
    }
    self.atom()
  }

  fn atom(&mut self) -> Result<Expr, String> {
    let Some(tok) = self.peek().map(str::to_string) else {
      return Err("unexpected end of expression".to_string());
    };
    self.pos += 1;
    match tok.as_str() {
      "(" => {
        let inner = self.or()?;
        if self.peek() != Some(")") {
          return Err("missing ')'".to_string());
        }
        self.pos += 1;
        Ok(inner)
      }
      ")" | "&&" | "||" => Err(format!("unexpected '{tok}'")),
      _ => Ok(Expr::Tag(tok)),
    }
  }
}

/// Evaluate one `// +build` line: space-separated options are ORed,
/// comma-separated terms within an option are ANDed, `!` negates a term.
fn plus_build_line(line: &str, ctx: &BuildContext) -> bool {
  line.split_whitespace().any(|option| {
    option.split(',').all(|term| match term.strip_prefix('!') {
      Some(tag) => !tag.is_empty() && !tag.starts_with('!') && !ctx.matches_tag(tag),
      None => !term.is_empty() && ctx.matches_tag(term),
    })
  })
}

/// Whether the constraint comments at the top of `src` admit the file.
pub fn should_build(src: &str, ctx: &BuildContext) -> Result<bool, ConstraintError> {
  let mut go_build = None;
  let mut plus_build = Vec::new();

  for line in leading_comments(src) {
    let Some(expr) = line.strip_prefix("//go:build") else {
      continue;
    };
    if !expr.is_empty() && !expr.starts_with([' ', '\t']) {
      continue;
    }
    if go_build.is_some() {
      return Err(ConstraintError::MultipleGoBuild);
    }
    go_build = Some(Expr::parse(expr.trim())?);
  }
  if let Some(expr) = go_build {
    return Ok(expr.eval(ctx));
  }

  for line in constraint_lines(src) {
    if let Some(rest) = line.strip_prefix("//").map(str::trim_start).and_then(|c| c.strip_prefix("+build"))
      && (rest.is_empty() || rest.starts_with([' ', '\t']))
    {
      plus_build.push(rest.trim());
    }
  }

  Ok(plus_build.iter().all(|line| plus_build_line(line, ctx)))
}

/// Whether a file name's `_GOOS`, `_GOARCH` or `_GOOS_GOARCH` suffix admits the file.
///
/// `name` is the base name including its extension. A leading element (the
/// part before the first `_`) never counts as a suffix, so `linux.go` always
/// matches.
pub fn matches_file_name(name: &str, ctx: &BuildContext) -> bool {
  let stem = name.split_once('.').map(|(stem, _)| stem).unwrap_or(name);
  let stem = stem.strip_suffix("_test").unwrap_or(stem);
  let parts: Vec<&str> = stem.split('_').skip(1).collect();
  let platform = ctx.platform();

  match parts.as_slice() {
    [.., os, arch] if is_known_os(os) && is_known_arch(arch) => {
      *os == platform.os.as_str() && *arch == platform.arch.as_str()
    }
    [.., last] if is_known_os(last) => *last == platform.os.as_str(),
    [.., last] if is_known_arch(last) => *last == platform.arch.as_str(),
    _ => true,
  }
}
