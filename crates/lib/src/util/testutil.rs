//! Test utilities for appstager-lib.
//!
//! Builds throwaway workspace roots (`<root>/src/<import path>`) populated
//! with minimal Go packages.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Render a Go file declaring `package` and importing `imports`.
pub fn go_file(package: &str, imports: &[&str]) -> String {
  let mut src = format!("package {package}\n\n");
  if !imports.is_empty() {
    src.push_str("import (\n");
    for import in imports {
      src.push_str(&format!("\t{import:?}\n"));
    }
    src.push_str(")\n");
  }
  src.push_str("\nfunc init() {}\n");
  src
}

/// A temporary workspace root.
pub struct Workspace {
  temp: TempDir,
}

impl Workspace {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// The workspace root (the directory that contains `src/`).
  pub fn root(&self) -> PathBuf {
    self.temp.path().to_path_buf()
  }

  /// Write a file relative to the workspace root, creating parents.
  pub fn write(&self, relative_path: &str, content: &str) -> PathBuf {
    write_file(&self.temp.path().join(relative_path), content)
  }

  /// Create package `name` at `src/<import_path>` with a single `<name>.go` file.
  pub fn package(&self, import_path: &str, name: &str, imports: &[&str]) -> PathBuf {
    let dir = self.temp.path().join("src").join(import_path);
    write_file(&dir.join(format!("{name}.go")), &go_file(name, imports));
    dir
  }
}

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> PathBuf {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, content).unwrap();
  path.to_path_buf()
}
