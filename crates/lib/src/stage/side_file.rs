//! Side files telling the platform builder where the main package lives.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{MAIN_PACKAGE_PATH_FILE, MODULE_MAIN_PACKAGE_PATH_FILE, MODULE_MANIFEST, STAGED_GOPATH_DIR};
use crate::context::BuildContext;
use crate::platform::paths::to_slash;

#[derive(Debug, Error)]
pub enum SideFileError {
  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },

  #[error("failed to inspect {}: {source}", path.display())]
  Inspect { path: PathBuf, source: std::io::Error },

  #[error("{} is not inside module root {}", app_dir.display(), module_root.display())]
  OutsideModule { app_dir: PathBuf, module_root: PathBuf },
}

/// A side file written into the staged tree.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SideFile {
  pub path: PathBuf,
  pub content: String,
}

/// Find the directory holding the nearest `go.mod`, searching `dir` and its ancestors.
pub fn find_module_root(dir: &Path) -> Result<Option<PathBuf>, SideFileError> {
  for candidate in dir.ancestors() {
    let manifest = candidate.join(MODULE_MANIFEST);
    match fs::metadata(&manifest) {
      Ok(meta) if meta.is_file() => return Ok(Some(candidate.to_path_buf())),
      Ok(_) => {}
      Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {}
      Err(source) => return Err(SideFileError::Inspect { path: manifest, source }),
    }
  }
  Ok(None)
}

fn write(path: PathBuf, content: String) -> Result<SideFile, SideFileError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|source| SideFileError::Write {
      path: parent.to_path_buf(),
      source,
    })?;
  }
  fs::write(&path, &content).map_err(|source| SideFileError::Write {
    path: path.clone(),
    source,
  })?;
  info!(path = %path.display(), main_package = %content, "wrote main package path");
  Ok(SideFile { path, content })
}

/// Write `_gopath/main-package-path` with the app's import path.
///
/// Returns `Ok(None)` without writing when no workspace root contains `app_dir`.
pub fn write_main_package_path(
  staged_dir: &Path,
  app_dir: &Path,
  ctx: &BuildContext,
) -> Result<Option<SideFile>, SideFileError> {
  let Some((_, import_path)) = ctx.locate(app_dir) else {
    debug!(app_dir = %app_dir.display(), "app is outside every workspace root, no main package path");
    return Ok(None);
  };
  let path = staged_dir.join(STAGED_GOPATH_DIR).join(MAIN_PACKAGE_PATH_FILE);
  write(path, import_path).map(Some)
}

/// Write `_main-package-path` with the app's path relative to its module root.
pub fn write_module_main_package_path(
  staged_dir: &Path,
  app_dir: &Path,
  module_root: &Path,
) -> Result<SideFile, SideFileError> {
  let rel = app_dir
    .strip_prefix(module_root)
    .map_err(|_| SideFileError::OutsideModule {
      app_dir: app_dir.to_path_buf(),
      module_root: module_root.to_path_buf(),
    })?;
  write(staged_dir.join(MODULE_MAIN_PACKAGE_PATH_FILE), to_slash(rel))
}
