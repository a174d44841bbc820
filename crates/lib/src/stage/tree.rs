//! Staging tree assembly.
//!
//! Copies directory contents into the staged tree, following symbolic links
//! so the staged tree only ever holds regular files and directories.
//! Version-control metadata and CI configuration are never copied.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::consts::EXCLUDED_ENTRIES;
use crate::package::join_import_path;
use crate::resolve::ResolvedPackage;

/// Errors assembling the staged tree.
#[derive(Debug, Error)]
pub enum TreeError {
  #[error("failed to {action} {}: {source}", path.display())]
  Filesystem {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to copy dependency {import_path}: {source}")]
  Bundle {
    import_path: String,
    #[source]
    source: Box<TreeError>,
  },
}

/// Counters accumulated while copying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyReport {
  pub files_copied: u64,
  pub bytes_copied: u64,
  /// Excluded source entries, in the order they were encountered.
  pub skipped: Vec<PathBuf>,
}

fn is_excluded(name: &std::ffi::OsStr) -> bool {
  name.to_str().is_some_and(|name| EXCLUDED_ENTRIES.contains(&name))
}

/// Copy the contents of `src_dir` into `dst_root/dst_subpath`.
///
/// Without `recursive`, only the regular files directly inside `src_dir`
/// are copied. Existing destination files are overwritten.
pub fn copy_tree(
  dst_root: &Path,
  dst_subpath: &Path,
  src_dir: &Path,
  recursive: bool,
  report: &mut CopyReport,
) -> Result<(), TreeError> {
  let dst = dst_root.join(dst_subpath);
  fs::create_dir_all(&dst).map_err(|source| TreeError::Filesystem {
    action: "create directory",
    path: dst.clone(),
    source,
  })?;

  let mut skipped = Vec::new();
  let walker = WalkDir::new(src_dir)
    .min_depth(1)
    .max_depth(if recursive { usize::MAX } else { 1 })
    .follow_links(true)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| {
      if is_excluded(e.file_name()) {
        info!(path = %e.path().display(), "skipping");
        skipped.push(e.path().to_path_buf());
        return false;
      }
      true
    });

  for entry in walker {
    let entry = entry.map_err(|e| TreeError::Filesystem {
      action: "read",
      path: e.path().map(Path::to_path_buf).unwrap_or_else(|| src_dir.to_path_buf()),
      source: e.into(),
    })?;
    let Ok(rel) = entry.path().strip_prefix(src_dir) else {
      continue;
    };
    let target = dst.join(rel);
    let file_type = entry.file_type();

    if file_type.is_dir() {
      if !recursive {
        continue;
      }
      fs::create_dir_all(&target).map_err(|source| TreeError::Filesystem {
        action: "create directory",
        path: target.clone(),
        source,
      })?;
    } else if file_type.is_file() {
      let bytes = fs::copy(entry.path(), &target).map_err(|source| TreeError::Filesystem {
        action: "copy",
        path: entry.path().to_path_buf(),
        source,
      })?;
      debug!(from = %entry.path().display(), to = %target.display(), bytes, "copied");
      report.files_copied += 1;
      report.bytes_copied += bytes;
    } else {
      debug!(path = %entry.path().display(), "ignoring special file");
    }
  }

  report.skipped.append(&mut skipped);
  Ok(())
}

/// Copy each package's own files into `dst_root/deps_subpath/<import path>`.
pub fn bundle_all(
  dst_root: &Path,
  deps_subpath: &Path,
  packages: &[ResolvedPackage],
  report: &mut CopyReport,
) -> Result<(), TreeError> {
  for pkg in packages {
    let src = join_import_path(&pkg.source_root, &pkg.import_path);
    let dst_subpath = join_import_path(deps_subpath, &pkg.import_path);
    copy_tree(dst_root, &dst_subpath, &src, false, report).map_err(|e| TreeError::Bundle {
      import_path: pkg.import_path.clone(),
      source: Box::new(e),
    })?;
  }
  Ok(())
}
