//! Package metadata provider.
//!
//! The closure resolver only needs two questions answered: "what package
//! lives in this directory?" and "where does this import path lead when
//! imported from that directory?". [`PackageProvider`] is that seam;
//! [`GoProvider`] answers it by reading Go sources from disk.
//!
//! # Modules
//!
//! - [`scan`] - Package clause and import declaration scanning
//! - [`constraint`] - Build constraint and file name suffix matching

pub mod constraint;
pub mod scan;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::trace;

use crate::consts::VENDOR_DIR;
use crate::context::BuildContext;

/// Errors reported while reading a package.
#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("no buildable Go source files in {}", dir.display())]
  NoGoFiles { dir: PathBuf },

  #[error("found packages {first} and {second} in {}", dir.display())]
  MultiplePackages {
    dir: PathBuf,
    first: String,
    second: String,
  },

  #[error("failed to read directory {}: {source}", path.display())]
  ReadDir { path: PathBuf, source: std::io::Error },

  #[error("failed to read {}: {source}", path.display())]
  ReadFile { path: PathBuf, source: std::io::Error },

  #[error("malformed source {}: {reason}", path.display())]
  Malformed { path: PathBuf, reason: String },

  #[error("invalid import path {import_path:?}")]
  InvalidImportPath { import_path: String },

  #[error("cannot find package {import_path:?} in any of:\n  {}", format_searched(.searched))]
  NotFound { import_path: String, searched: Vec<PathBuf> },

  #[error("local import {import_path:?} from {} is outside every workspace root", from_dir.display())]
  LocalImportOutsideWorkspace { import_path: String, from_dir: PathBuf },
}

fn format_searched(searched: &[PathBuf]) -> String {
  searched
    .iter()
    .map(|p| p.display().to_string())
    .collect::<Vec<_>>()
    .join("\n  ")
}

/// What a directory's buildable sources declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
  /// Package name from the package clause.
  pub name: String,
  /// Absolute package directory.
  pub dir: PathBuf,
  /// Imports of all buildable non-test files, sorted and de-duplicated.
  pub imports: Vec<String>,
  /// Buildable non-test Go files, by base name.
  pub go_files: Vec<String>,
}

impl PackageInfo {
  /// Whether this package builds an executable.
  pub fn is_entry_point(&self) -> bool {
    self.name == "main"
  }
}

/// A package found through an import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedPackage {
  /// Workspace source directory (`<root>/src`) the package lives under.
  pub source_root: PathBuf,
  /// Import path relative to `source_root`; vendored packages include their `vendor/` prefix.
  pub import_path: String,
  pub package: PackageInfo,
}

/// Reads package metadata for the closure resolver.
pub trait PackageProvider {
  /// Read the package in `dir`.
  fn import_dir(&self, dir: &Path, ctx: &BuildContext) -> Result<PackageInfo, ProviderError>;

  /// Locate and read the package `import_path` as imported from `from_dir`.
  fn import(&self, import_path: &str, from_dir: &Path, ctx: &BuildContext) -> Result<LocatedPackage, ProviderError>;
}

/// Provider backed by Go sources in workspace directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoProvider;

impl GoProvider {
  pub fn new() -> Self {
    Self
  }

  fn import_local(
    &self,
    import_path: &str,
    from_dir: &Path,
    ctx: &BuildContext,
  ) -> Result<LocatedPackage, ProviderError> {
    let dir = clean(&from_dir.join(import_path));
    let Some((source_root, located_path)) = ctx.locate(&dir) else {
      return Err(ProviderError::LocalImportOutsideWorkspace {
        import_path: import_path.to_string(),
        from_dir: from_dir.to_path_buf(),
      });
    };
    if !dir.is_dir() {
      return Err(ProviderError::NotFound {
        import_path: import_path.to_string(),
        searched: vec![dir],
      });
    }
    let package = self.import_dir(&dir, ctx)?;
    Ok(LocatedPackage {
      source_root,
      import_path: located_path,
      package,
    })
  }

  /// Search `vendor/` directories from `from_dir` up to its source root, innermost first.
  fn search_vendor(
    &self,
    import_path: &str,
    from_dir: &Path,
    ctx: &BuildContext,
    searched: &mut Vec<PathBuf>,
  ) -> Result<Option<LocatedPackage>, ProviderError> {
    for source_root in ctx.source_roots() {
      let Ok(rel) = from_dir.strip_prefix(&source_root) else {
        continue;
      };
      let segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

      for depth in (0..=segments.len()).rev() {
        let base = segments[..depth].iter().fold(source_root.clone(), |p, s| p.join(s));
        let vendor = base.join(VENDOR_DIR);
        if !vendor.is_dir() {
          continue;
        }
        let candidate = join_import_path(&vendor, import_path);
        searched.push(candidate.clone());
        if candidate.is_dir() && has_go_files(&candidate) {
          let mut parts: Vec<&str> = segments[..depth].iter().map(String::as_str).collect();
          parts.push(VENDOR_DIR);
          parts.push(import_path);
          trace!(import_path, vendor = %vendor.display(), "resolved through vendor directory");
          let package = self.import_dir(&candidate, ctx)?;
          return Ok(Some(LocatedPackage {
            source_root,
            import_path: parts.join("/"),
            package,
          }));
        }
      }
      break;
    }
    Ok(None)
  }
}

impl PackageProvider for GoProvider {
  fn import_dir(&self, dir: &Path, ctx: &BuildContext) -> Result<PackageInfo, ProviderError> {
    let entries = fs::read_dir(dir).map_err(|source| ProviderError::ReadDir {
      path: dir.to_path_buf(),
      source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|source| ProviderError::ReadDir {
        path: dir.to_path_buf(),
        source,
      })?;
      names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let mut name: Option<(String, String)> = None;
    let mut imports = BTreeSet::new();
    let mut go_files = Vec::new();

    for file_name in names {
      if !is_candidate_go_file(&file_name) || !constraint::matches_file_name(&file_name, ctx) {
        continue;
      }
      let path = dir.join(&file_name);
      // Follows symlinks; dangling links and directories named *.go are not sources.
      if !fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false) {
        continue;
      }
      let bytes = fs::read(&path).map_err(|source| ProviderError::ReadFile {
        path: path.clone(),
        source,
      })?;
      let src = String::from_utf8_lossy(&bytes);

      let buildable = constraint::should_build(&src, ctx).map_err(|e| ProviderError::Malformed {
        path: path.clone(),
        reason: e.to_string(),
      })?;
      if !buildable {
        trace!(file = %path.display(), "excluded by build constraints");
        continue;
      }

      let header = scan::parse_header(&src).map_err(|e| ProviderError::Malformed {
        path: path.clone(),
        reason: e.to_string(),
      })?;
      if header.package == "documentation" {
        continue;
      }

      match &name {
        Some((existing, first_file)) if *existing != header.package => {
          return Err(ProviderError::MultiplePackages {
            dir: dir.to_path_buf(),
            first: format!("{existing} ({first_file})"),
            second: format!("{} ({file_name})", header.package),
          });
        }
        Some(_) => {}
        None => name = Some((header.package.clone(), file_name.clone())),
      }

      imports.extend(header.imports);
      go_files.push(file_name);
    }

    let Some((name, _)) = name else {
      return Err(ProviderError::NoGoFiles { dir: dir.to_path_buf() });
    };

    Ok(PackageInfo {
      name,
      dir: dir.to_path_buf(),
      imports: imports.into_iter().collect(),
      go_files,
    })
  }

  fn import(&self, import_path: &str, from_dir: &Path, ctx: &BuildContext) -> Result<LocatedPackage, ProviderError> {
    if import_path.is_empty() || import_path.starts_with('/') || import_path.contains('\\') {
      return Err(ProviderError::InvalidImportPath {
        import_path: import_path.to_string(),
      });
    }
    if is_local_import(import_path) {
      return self.import_local(import_path, from_dir, ctx);
    }

    let mut searched = Vec::new();
    if let Some(found) = self.search_vendor(import_path, from_dir, ctx, &mut searched)? {
      return Ok(found);
    }

    for source_root in ctx.source_roots() {
      let dir = join_import_path(&source_root, import_path);
      searched.push(dir.clone());
      if dir.is_dir() {
        let package = self.import_dir(&dir, ctx)?;
        return Ok(LocatedPackage {
          source_root,
          import_path: import_path.to_string(),
          package,
        });
      }
    }

    Err(ProviderError::NotFound {
      import_path: import_path.to_string(),
      searched,
    })
  }
}

fn is_candidate_go_file(name: &str) -> bool {
  name.ends_with(".go") && !name.starts_with(['_', '.']) && !name.ends_with("_test.go")
}

fn is_local_import(import_path: &str) -> bool {
  import_path == "." || import_path == ".." || import_path.starts_with("./") || import_path.starts_with("../")
}

fn has_go_files(dir: &Path) -> bool {
  fs::read_dir(dir)
    .map(|entries| {
      entries.flatten().any(|entry| {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        name.ends_with(".go") && fs::metadata(entry.path()).map(|m| m.is_file()).unwrap_or(false)
      })
    })
    .unwrap_or(false)
}

/// Append a slash-separated import path to a directory.
pub fn join_import_path(base: &Path, import_path: &str) -> PathBuf {
  import_path
    .split('/')
    .filter(|s| !s.is_empty())
    .fold(base.to_path_buf(), |p, s| p.join(s))
}

/// Lexically remove `.` and `..` components.
fn clean(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        out.pop();
      }
      other => out.push(other.as_os_str()),
    }
  }
  out
}
