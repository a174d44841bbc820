//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Render a Go file declaring `package` and importing `imports`.
pub fn go_file(package: &str, imports: &[&str]) -> String {
  let mut src = format!("package {package}\n\n");
  for import in imports {
    src.push_str(&format!("import {import:?}\n"));
  }
  src.push_str("\nfunc init() {}\n");
  src
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding a workspace root
/// (`gopath/`), a home directory, and room for apps and staged trees.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  fn dir(&self, name: &str) -> PathBuf {
    let p = self.temp.path().join(name);
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Workspace root exported as `GOPATH`.
  pub fn gopath(&self) -> PathBuf {
    self.dir("gopath")
  }

  /// Home directory (isolated per test).
  pub fn home(&self) -> PathBuf {
    self.dir("home")
  }

  /// Destination of the staged tree. Not created up front.
  pub fn staged_dir(&self) -> PathBuf {
    self.dir("out").join("staged")
  }

  /// Write a file relative to the temp directory, creating parents.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    dunce::canonicalize(&path).unwrap_or(path)
  }

  /// Create package `name` at `gopath/src/<import_path>` and return its directory.
  pub fn go_package(&self, import_path: &str, name: &str, imports: &[&str]) -> PathBuf {
    let file = self.write_file(
      &format!("gopath/src/{import_path}/{name}.go"),
      &go_file(name, imports),
    );
    file.parent().unwrap().to_path_buf()
  }

  /// Get a pre-configured Command for the go-app-stager binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `GOPATH`: Isolated workspace root
  /// - `HOME`: Isolated home directory
  ///
  /// `GO111MODULE` and `RUST_LOG` are cleared.
  pub fn stager_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("go-app-stager");
    cmd.env("GOPATH", self.gopath());
    cmd.env("HOME", self.home());
    cmd.env_remove("GO111MODULE");
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Command staging `app_dir` with the given fixture descriptor into [`TestEnv::staged_dir`].
  pub fn stage_cmd(&self, fixture: &str, app_dir: &Path) -> Command {
    let mut cmd = self.stager_cmd();
    cmd.arg(fixture_path(fixture)).arg(app_dir).arg(self.staged_dir());
    cmd
  }
}
