//! Staging strategies and orchestration.
//!
//! A [`StagingStrategy`] is selected once per run from the runtime family and
//! module mode. It carries the [`BuildContext`] used to read package sources
//! and decides how the staged tree is laid out:
//!
//! | Strategy | Dependencies | Layout |
//! |----------|--------------|--------|
//! | Legacy standard | resolved closure | merged into the staged root |
//! | Flexible | resolved closure | vendored under `_gopath/src` |
//! | Standard second generation | whole module, or as flexible | module copied to the staged root |
//!
//! # Modules
//!
//! - [`tree`] - Directory copying and dependency bundling
//! - [`side_file`] - Main package path side files and module root discovery

pub mod side_file;
pub mod tree;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{ModuleMode, RuntimeKind};
use crate::consts::{STAGED_GOPATH_DIR, WORKSPACE_SRC_DIR};
use crate::context::{BuildContext, SkipList};
use crate::package::PackageProvider;
use crate::resolve::{ResolveError, resolve};

use self::side_file::{SideFile, SideFileError};
use self::tree::{CopyReport, TreeError};

/// Errors produced while staging an application.
#[derive(Debug, Error)]
pub enum StageError {
  #[error("could not get absolute path for {}: {source}", path.display())]
  AbsolutePath { path: PathBuf, source: std::io::Error },

  #[error("staged directory {} is inside {}, which is copied into it", dst.display(), src.display())]
  DestinationInsideSource { dst: PathBuf, src: PathBuf },

  #[error("failed analyzing {}: {source}", app_dir.display())]
  Resolve {
    app_dir: PathBuf,
    #[source]
    source: ResolveError,
  },

  #[error("failed finding go.mod for {}: {source}", app_dir.display())]
  ModuleManifest {
    app_dir: PathBuf,
    #[source]
    source: SideFileError,
  },

  #[error(transparent)]
  SideFile(#[from] SideFileError),

  #[error(transparent)]
  Tree(#[from] TreeError),
}

/// Where bundled dependencies are placed relative to the staged root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StagingLayout {
  /// Dependencies and application files share the staged root.
  Merged,
  /// Dependencies live under `_gopath/src/<import path>`.
  Vendored,
}

impl StagingLayout {
  fn deps_subpath(self) -> PathBuf {
    match self {
      StagingLayout::Merged => PathBuf::new(),
      StagingLayout::Vendored => Path::new(STAGED_GOPATH_DIR).join(WORKSPACE_SRC_DIR),
    }
  }
}

/// How an application is staged, chosen once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingStrategy {
  /// Resolve the closure and merge it with the app at the staged root.
  LegacyStandard { context: BuildContext },
  /// Resolve the closure and vendor it under `_gopath/src`.
  Flex { context: BuildContext },
  /// Copy the enclosing module, or fall back to [`StagingStrategy::Flex`] behavior.
  StandardSecondGen {
    context: BuildContext,
    module_mode: ModuleMode,
  },
}

impl StagingStrategy {
  /// Select the strategy for `kind`, building its context for `go1.{minor_version}`.
  pub fn select(kind: RuntimeKind, minor_version: u32, workspace_roots: Vec<PathBuf>, module_mode: ModuleMode) -> Self {
    match kind {
      RuntimeKind::LegacyStandard => StagingStrategy::LegacyStandard {
        context: BuildContext::new(["appengine", "purego"], minor_version, workspace_roots),
      },
      RuntimeKind::Flex => StagingStrategy::Flex {
        context: BuildContext::new(["appenginevm"], minor_version, workspace_roots),
      },
      RuntimeKind::StandardSecondGen => StagingStrategy::StandardSecondGen {
        context: BuildContext::new(Vec::<String>::new(), minor_version, workspace_roots),
        module_mode,
      },
    }
  }

  pub fn context(&self) -> &BuildContext {
    match self {
      StagingStrategy::LegacyStandard { context }
      | StagingStrategy::Flex { context }
      | StagingStrategy::StandardSecondGen { context, .. } => context,
    }
  }

  /// Import path roots provided by the target runtime.
  pub fn skip_list(&self) -> SkipList {
    match self {
      StagingStrategy::LegacyStandard { .. } => SkipList::legacy_standard(),
      StagingStrategy::Flex { .. } | StagingStrategy::StandardSecondGen { .. } => SkipList::standard(),
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      StagingStrategy::LegacyStandard { .. } => "legacy-standard",
      StagingStrategy::Flex { .. } => "flex",
      StagingStrategy::StandardSecondGen { .. } => "standard-second-gen",
    }
  }
}

impl fmt::Display for StagingStrategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// Where the staged dependencies came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencySource {
  /// Resolved from workspace roots and bundled.
  Workspace,
  /// The enclosing module was copied whole.
  Module,
}

/// Summary of a completed staging run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
  pub strategy: &'static str,
  pub dependencies: DependencySource,
  /// `None` when a whole module was copied.
  pub layout: Option<StagingLayout>,
  pub app_dir: PathBuf,
  pub staged_dir: PathBuf,
  /// Import paths of bundled packages, sorted.
  pub packages: Vec<String>,
  #[serde(flatten)]
  pub copy: CopyReport,
  pub side_file: Option<SideFile>,
}

fn absolute(path: &Path) -> Result<PathBuf, StageError> {
  std::path::absolute(path).map_err(|source| StageError::AbsolutePath {
    path: path.to_path_buf(),
    source,
  })
}

/// Resolve symlinks in the longest existing prefix of `path`, then re-append
/// the components that do not exist yet.
fn resolve_existing(path: &Path) -> PathBuf {
  let mut existing = path;
  let mut missing = Vec::new();
  loop {
    if let Ok(resolved) = dunce::canonicalize(existing) {
      return missing.iter().rev().fold(resolved, |acc, name| acc.join(name));
    }
    match (existing.parent(), existing.file_name()) {
      (Some(parent), Some(name)) => {
        missing.push(name);
        existing = parent;
      }
      _ => return path.to_path_buf(),
    }
  }
}

/// Whether `dst` is `src` or lies beneath it, lexically or after resolving symlinks.
fn is_within(dst: &Path, src: &Path) -> bool {
  dst.starts_with(src) || resolve_existing(dst).starts_with(resolve_existing(src))
}

fn ensure_outside(dst: &Path, src: &Path) -> Result<(), StageError> {
  if is_within(dst, src) {
    return Err(StageError::DestinationInsideSource {
      dst: dst.to_path_buf(),
      src: src.to_path_buf(),
    });
  }
  Ok(())
}

/// Stage the application in `app_dir` into `staged_dir` using `strategy`.
pub fn stage<P>(
  strategy: &StagingStrategy,
  provider: &P,
  app_dir: &Path,
  staged_dir: &Path,
) -> Result<StageReport, StageError>
where
  P: PackageProvider + ?Sized,
{
  let app_dir = absolute(app_dir)?;
  let staged_dir = absolute(staged_dir)?;
  info!(
    strategy = %strategy,
    target = %strategy.context().platform(),
    app = %app_dir.display(),
    staged = %staged_dir.display(),
    "staging app"
  );

  match strategy {
    StagingStrategy::LegacyStandard { context } => stage_closure(
      strategy,
      provider,
      context,
      &app_dir,
      &staged_dir,
      StagingLayout::Merged,
    ),
    StagingStrategy::Flex { context } => stage_closure(
      strategy,
      provider,
      context,
      &app_dir,
      &staged_dir,
      StagingLayout::Vendored,
    ),
    StagingStrategy::StandardSecondGen { context, module_mode } => {
      let module_root = side_file::find_module_root(&app_dir).map_err(|source| StageError::ModuleManifest {
        app_dir: app_dir.clone(),
        source,
      })?;
      let module_root = module_root.filter(|root| {
        *module_mode == ModuleMode::On || !context.workspace_roots().iter().any(|ws| root.starts_with(ws))
      });
      match module_root {
        Some(module_root) => {
          info!(module_root = %module_root.display(), "building with dependencies from go.mod");
          stage_module(strategy, &module_root, &app_dir, &staged_dir)
        }
        None => {
          info!("building with dependencies from workspace roots");
          stage_closure(
            strategy,
            provider,
            context,
            &app_dir,
            &staged_dir,
            StagingLayout::Vendored,
          )
        }
      }
    }
  }
}

fn stage_closure<P>(
  strategy: &StagingStrategy,
  provider: &P,
  context: &BuildContext,
  app_dir: &Path,
  staged_dir: &Path,
  layout: StagingLayout,
) -> Result<StageReport, StageError>
where
  P: PackageProvider + ?Sized,
{
  ensure_outside(staged_dir, app_dir)?;

  let side_file = match layout {
    StagingLayout::Vendored => side_file::write_main_package_path(staged_dir, app_dir, context)?,
    StagingLayout::Merged => None,
  };

  let require_entry_point = layout == StagingLayout::Vendored;
  let packages = resolve(provider, app_dir, context, &strategy.skip_list(), require_entry_point).map_err(
    |source| StageError::Resolve {
      app_dir: app_dir.to_path_buf(),
      source,
    },
  )?;

  let mut copy = CopyReport::default();
  tree::bundle_all(staged_dir, &layout.deps_subpath(), &packages, &mut copy)?;
  // Application files overwrite any bundled file at the same path.
  tree::copy_tree(staged_dir, Path::new(""), app_dir, true, &mut copy)?;

  info!(packages = packages.len(), files = copy.files_copied, "staged app");
  Ok(StageReport {
    strategy: strategy.name(),
    dependencies: DependencySource::Workspace,
    layout: Some(layout),
    app_dir: app_dir.to_path_buf(),
    staged_dir: staged_dir.to_path_buf(),
    packages: packages.into_iter().map(|p| p.import_path).collect(),
    copy,
    side_file,
  })
}

fn stage_module(
  strategy: &StagingStrategy,
  module_root: &Path,
  app_dir: &Path,
  staged_dir: &Path,
) -> Result<StageReport, StageError> {
  ensure_outside(staged_dir, module_root)?;

  let side_file = side_file::write_module_main_package_path(staged_dir, app_dir, module_root)?;
  let mut copy = CopyReport::default();
  tree::copy_tree(staged_dir, Path::new(""), module_root, true, &mut copy)?;

  info!(files = copy.files_copied, "staged module");
  Ok(StageReport {
    strategy: strategy.name(),
    dependencies: DependencySource::Module,
    layout: None,
    app_dir: app_dir.to_path_buf(),
    staged_dir: staged_dir.to_path_buf(),
    packages: Vec::new(),
    copy,
    side_file: Some(side_file),
  })
}
