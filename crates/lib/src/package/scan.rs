//! Go source header scanner.
//!
//! Reads a Go file only as far as its import declarations: the package clause
//! followed by any number of `import` declarations, single or parenthesized.
//! Everything after the last import is ignored, so syntax errors in function
//! bodies never affect staging.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// Package name and import paths declared by one Go source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
  pub package: String,
  pub imports: Vec<String>,
}

/// Errors produced while scanning a file header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
  #[error("line {line}: expected {expected}, found {found}")]
  Unexpected {
    line: usize,
    expected: &'static str,
    found: String,
  },

  #[error("line {line}: unterminated {what}")]
  Unterminated { line: usize, what: &'static str },

  #[error("line {line}: invalid escape sequence in string literal")]
  InvalidEscape { line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
  Ident(String),
  Str(String),
  LParen,
  RParen,
  Semi,
  Dot,
  Other(char),
  Eof,
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Token::Ident(s) => write!(f, "'{s}'"),
      Token::Str(s) => write!(f, "{s:?}"),
      Token::LParen => write!(f, "'('"),
      Token::RParen => write!(f, "')'"),
      Token::Semi => write!(f, "';'"),
      Token::Dot => write!(f, "'.'"),
      Token::Other(c) => write!(f, "'{c}'"),
      Token::Eof => write!(f, "end of file"),
    }
  }
}

struct Lexer<'a> {
  src: &'a str,
  chars: Peekable<CharIndices<'a>>,
  line: usize,
}

impl<'a> Lexer<'a> {
  fn new(src: &'a str) -> Self {
    let src = src.strip_prefix('\u{feff}').unwrap_or(src);
    Self {
      src,
      chars: src.char_indices().peekable(),
      line: 1,
    }
  }

  fn peek_char(&mut self) -> Option<char> {
    self.chars.peek().map(|&(_, c)| c)
  }

  fn offset(&mut self) -> usize {
    self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len())
  }

  /// Next token, with comments and whitespace (newlines included) skipped.
  fn next_token(&mut self) -> Result<Token, ScanError> {
    loop {
      let Some(&(start, c)) = self.chars.peek() else {
        return Ok(Token::Eof);
      };
      match c {
        '\n' => {
          self.line += 1;
          self.chars.next();
        }
        c if c.is_whitespace() => {
          self.chars.next();
        }
        '/' => {
          self.chars.next();
          match self.peek_char() {
            Some('/') => {
              while let Some(c) = self.peek_char() {
                if c == '\n' {
                  break;
                }
                self.chars.next();
              }
            }
            Some('*') => {
              self.chars.next();
              self.block_comment()?;
            }
            _ => return Ok(Token::Other('/')),
          }
        }
        '"' => {
          self.chars.next();
          return self.interpreted_string();
        }
        '`' => {
          self.chars.next();
          return self.raw_string();
        }
        '(' | ')' | ';' | '.' => {
          self.chars.next();
          return Ok(match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            ';' => Token::Semi,
            _ => Token::Dot,
          });
        }
        c if c == '_' || c.is_alphabetic() => {
          while let Some(c) = self.peek_char() {
            if c == '_' || c.is_alphanumeric() {
              self.chars.next();
            } else {
              break;
            }
          }
          let end = self.offset();
          return Ok(Token::Ident(self.src[start..end].to_string()));
        }
        other => {
          self.chars.next();
          return Ok(Token::Other(other));
        }
      }
    }
  }

  /// Next token that is not a statement separator.
  fn next_item(&mut self) -> Result<Token, ScanError> {
    loop {
      match self.next_token()? {
        Token::Semi => continue,
        tok => return Ok(tok),
      }
    }
  }

  fn block_comment(&mut self) -> Result<(), ScanError> {
    let line = self.line;
    let mut star = false;
    for (_, c) in self.chars.by_ref() {
      match c {
        '/' if star => return Ok(()),
        '*' => star = true,
        '\n' => {
          self.line += 1;
          star = false;
        }
        _ => star = false,
      }
    }
    Err(ScanError::Unterminated {
      line,
      what: "block comment",
    })
  }

  fn raw_string(&mut self) -> Result<Token, ScanError> {
    let line = self.line;
    let mut out = String::new();
    for (_, c) in self.chars.by_ref() {
      match c {
        '`' => return Ok(Token::Str(out)),
        '\r' => {}
        '\n' => {
          self.line += 1;
          out.push(c);
        }
        _ => out.push(c),
      }
    }
    Err(ScanError::Unterminated {
      line,
      what: "raw string literal",
    })
  }

  fn interpreted_string(&mut self) -> Result<Token, ScanError> {
    let line = self.line;
    let mut out = String::new();
    while let Some((_, c)) = self.chars.next() {
      match c {
        '"' => return Ok(Token::Str(out)),
        '\n' => break,
        '\\' => out.push(self.escape()?),
        _ => out.push(c),
      }
    }
    Err(ScanError::Unterminated {
      line,
      what: "string literal",
    })
  }

  fn escape(&mut self) -> Result<char, ScanError> {
    let invalid = ScanError::InvalidEscape { line: self.line };
    let Some((_, c)) = self.chars.next() else {
      return Err(invalid);
    };
    let simple = match c {
      'a' => Some('\u{07}'),
      'b' => Some('\u{08}'),
      'f' => Some('\u{0c}'),
      'n' => Some('\n'),
      'r' => Some('\r'),
      't' => Some('\t'),
      'v' => Some('\u{0b}'),
      '\\' => Some('\\'),
      '"' => Some('"'),
      '\'' => Some('\''),
      _ => None,
    };
    if let Some(ch) = simple {
      return Ok(ch);
    }

    let (digits, radix, first) = match c {
      'x' => (2, 16, None),
      'u' => (4, 16, None),
      'U' => (8, 16, None),
      '0'..='7' => (2, 8, Some(c)),
      _ => return Err(invalid),
    };
    let mut text: String = first.into_iter().collect();
    for _ in 0..digits {
      match self.chars.next() {
        Some((_, d)) if d.is_digit(radix) => text.push(d),
        _ => return Err(invalid),
      }
    }
    u32::from_str_radix(&text, radix)
      .ok()
      .and_then(char::from_u32)
      .ok_or(invalid)
  }
}

/// Scan the package clause and import declarations of a Go source file.
pub fn parse_header(src: &str) -> Result<FileHeader, ScanError> {
  let mut lexer = Lexer::new(src);

  match lexer.next_item()? {
    Token::Ident(kw) if kw == "package" => {}
    found => return Err(unexpected(&lexer, "'package'", found)),
  }
  let package = match lexer.next_token()? {
    Token::Ident(name) => name,
    found => return Err(unexpected(&lexer, "package name", found)),
  };

  let mut imports = Vec::new();
  loop {
    match lexer.next_item()? {
      Token::Ident(kw) if kw == "import" => match lexer.next_token()? {
        Token::LParen => loop {
          match lexer.next_item()? {
            Token::RParen => break,
            tok => imports.push(import_spec(&mut lexer, tok)?),
          }
        },
        tok => imports.push(import_spec(&mut lexer, tok)?),
      },
      _ => break,
    }
  }

  Ok(FileHeader { package, imports })
}

fn import_spec(lexer: &mut Lexer<'_>, first: Token) -> Result<String, ScanError> {
  match first {
    Token::Str(path) => Ok(path),
    Token::Ident(_) | Token::Dot => match lexer.next_token()? {
      Token::Str(path) => Ok(path),
      found => Err(unexpected(lexer, "import path", found)),
    },
    found => Err(unexpected(lexer, "import path", found)),
  }
}

fn unexpected(lexer: &Lexer<'_>, expected: &'static str, found: Token) -> ScanError {
  ScanError::Unexpected {
    line: lexer.line,
    expected,
    found: found.to_string(),
  }
}

/// The leading run of blank lines and `//` comments, trimmed.
///
/// `//go:build` lines count anywhere in this run.
pub fn leading_comments(src: &str) -> Vec<&str> {
  let src = src.strip_prefix('\u{feff}').unwrap_or(src);
  src
    .lines()
    .map(str::trim)
    .take_while(|line| line.is_empty() || line.starts_with("//"))
    .collect()
}

/// Lines eligible to carry `// +build` constraints.
///
/// Only the leading comment run counts, and only up to its last blank line,
/// so a `// +build` line directly attached to the package clause (a doc
/// comment) is ignored.
pub fn constraint_lines(src: &str) -> Vec<&str> {
  let mut lines = leading_comments(src);
  let end = lines.iter().rposition(|line| line.is_empty()).unwrap_or(0);
  lines.truncate(end);
  lines
}
