//! Dependency closure resolution.
//!
//! Walks the import graph breadth-first from the application root and
//! returns every third-party package the application transitively imports.
//!
//! # Algorithm Overview
//!
//! 1. Read the root package; optionally require it to be an entry point
//! 2. Seed the queue with the root's imports, each paired with the root directory
//! 3. Pop an edge; drop it if already visited, mark it visited
//! 4. Drop edges whose leading segment is on the [`SkipList`]
//! 5. Resolve the edge through the [`PackageProvider`]; any failure aborts
//! 6. Record the package once per `(source root, import path)` identity
//! 7. Queue the package's own imports, paired with its directory
//!
//! Each `(import path, importing directory)` pair is processed at most once,
//! which bounds the walk on cyclic and diamond-shaped graphs.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::context::{BuildContext, SkipList};
use crate::package::{PackageProvider, ProviderError};

/// A third-party package that must be staged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResolvedPackage {
  /// Import path relative to `source_root`.
  pub import_path: String,
  /// Absolute package directory.
  pub dir: PathBuf,
  /// Workspace source directory containing the package.
  pub source_root: PathBuf,
}

impl ResolvedPackage {
  /// Physical identity: two packages with equal identities are the same directory.
  pub fn identity(&self) -> (&Path, &str) {
    (&self.source_root, &self.import_path)
  }
}

/// A pending import: the path and the directory of the package importing it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ImportEdge {
  import_path: String,
  from_dir: PathBuf,
}

/// Errors that can occur during closure resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("could not get absolute path for {}: {source}", path.display())]
  AbsolutePath { path: PathBuf, source: std::io::Error },

  #[error("could not get package for {}: {source}", dir.display())]
  PackageNotFound {
    dir: PathBuf,
    #[source]
    source: ProviderError,
  },

  #[error("the root of your app needs to be package \"main\" (currently {name:?})")]
  NotAnEntryPoint { dir: PathBuf, name: String },

  #[error("failed to resolve import {import_path:?} from {}: {source}", from_dir.display())]
  ImportResolutionFailed {
    import_path: String,
    from_dir: PathBuf,
    #[source]
    source: ProviderError,
  },
}

/// Compute the external packages transitively imported by the package in `root_dir`.
///
/// The result is sorted by import path, then source root.
///
/// # Errors
///
/// Returns [`ResolveError`] if:
/// - `root_dir` holds no package readable under `ctx`
/// - `require_entry_point` is set and the root package is a library
/// - Any non-skipped import cannot be resolved
pub fn resolve<P>(
  provider: &P,
  root_dir: &Path,
  ctx: &BuildContext,
  skip_list: &SkipList,
  require_entry_point: bool,
) -> Result<Vec<ResolvedPackage>, ResolveError>
where
  P: PackageProvider + ?Sized,
{
  let root_dir = std::path::absolute(root_dir).map_err(|source| ResolveError::AbsolutePath {
    path: root_dir.to_path_buf(),
    source,
  })?;
  let root = provider
    .import_dir(&root_dir, ctx)
    .map_err(|source| ResolveError::PackageNotFound {
      dir: root_dir.clone(),
      source,
    })?;
  if require_entry_point && !root.is_entry_point() {
    return Err(ResolveError::NotAnEntryPoint {
      dir: root_dir,
      name: root.name,
    });
  }

  let mut queue: VecDeque<ImportEdge> = root
    .imports
    .into_iter()
    .map(|import_path| ImportEdge {
      import_path,
      from_dir: root_dir.clone(),
    })
    .collect();
  let mut visited: HashSet<ImportEdge> = HashSet::new();
  let mut seen: HashSet<(PathBuf, String)> = HashSet::new();
  let mut packages = Vec::new();

  while let Some(edge) = queue.pop_front() {
    if visited.contains(&edge) {
      continue;
    }
    visited.insert(edge.clone());

    if skip_list.skips(&edge.import_path) {
      trace!(import_path = %edge.import_path, "skipping runtime-provided import");
      continue;
    }

    let located = provider
      .import(&edge.import_path, &edge.from_dir, ctx)
      .map_err(|source| ResolveError::ImportResolutionFailed {
        import_path: edge.import_path.clone(),
        from_dir: edge.from_dir.clone(),
        source,
      })?;

    if seen.insert((located.source_root.clone(), located.import_path.clone())) {
      debug!(
        import_path = %located.import_path,
        dir = %located.package.dir.display(),
        "resolved dependency"
      );
      packages.push(ResolvedPackage {
        import_path: located.import_path,
        dir: located.package.dir.clone(),
        source_root: located.source_root,
      });
    }

    let from_dir = located.package.dir;
    queue.extend(located.package.imports.into_iter().map(|import_path| ImportEdge {
      import_path,
      from_dir: from_dir.clone(),
    }));
  }

  packages.sort_by(|a, b| {
    a.import_path
      .cmp(&b.import_path)
      .then_with(|| a.source_root.cmp(&b.source_root))
  });
  info!(root = %root_dir.display(), count = packages.len(), "resolved dependency closure");

  Ok(packages)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;
  use std::collections::HashMap;

  use crate::package::{GoProvider, LocatedPackage, PackageInfo};
  use crate::util::testutil::Workspace;

  /// In-memory import graph. Aliases map an import path to another package's physical location.
  struct FakeProvider {
    root_name: String,
    root_imports: Vec<String>,
    packages: HashMap<String, Vec<String>>,
    aliases: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
  }

  impl FakeProvider {
    fn new(root_name: &str, root_imports: &[&str]) -> Self {
      Self {
        root_name: root_name.to_string(),
        root_imports: root_imports.iter().map(|s| s.to_string()).collect(),
        packages: HashMap::new(),
        aliases: HashMap::new(),
        calls: RefCell::new(Vec::new()),
      }
    }

    fn with(mut self, import_path: &str, imports: &[&str]) -> Self {
      self
        .packages
        .insert(import_path.to_string(), imports.iter().map(|s| s.to_string()).collect());
      self
    }

    fn alias(mut self, from: &str, to: &str) -> Self {
      self.aliases.insert(from.to_string(), to.to_string());
      self
    }
  }

  impl PackageProvider for FakeProvider {
    fn import_dir(&self, dir: &Path, _ctx: &BuildContext) -> Result<PackageInfo, ProviderError> {
      Ok(PackageInfo {
        name: self.root_name.clone(),
        dir: dir.to_path_buf(),
        imports: self.root_imports.clone(),
        go_files: vec!["main.go".to_string()],
      })
    }

    fn import(&self, import_path: &str, _from_dir: &Path, _ctx: &BuildContext) -> Result<LocatedPackage, ProviderError> {
      self.calls.borrow_mut().push(import_path.to_string());
      let physical = self.aliases.get(import_path).map(String::as_str).unwrap_or(import_path);
      let imports = self.packages.get(physical).ok_or_else(|| ProviderError::NotFound {
        import_path: import_path.to_string(),
        searched: vec![],
      })?;
      let source_root = PathBuf::from("/gopath/src");
      Ok(LocatedPackage {
        package: PackageInfo {
          name: physical.rsplit('/').next().unwrap_or(physical).to_string(),
          dir: source_root.join(physical),
          imports: imports.clone(),
          go_files: vec![],
        },
        source_root,
        import_path: physical.to_string(),
      })
    }
  }

  fn ctx() -> BuildContext {
    BuildContext::new(["appengine"], 9, vec![PathBuf::from("/gopath")])
  }

  fn import_paths(packages: &[ResolvedPackage]) -> Vec<&str> {
    packages.iter().map(|p| p.import_path.as_str()).collect()
  }

  #[test]
  fn transitive_imports_without_skipped_roots() {
    let provider = FakeProvider::new("main", &["pkgA", "stdlib-ns/foo"])
      .with("pkgA", &["pkgB"])
      .with("pkgB", &[]);
    let skip = SkipList::from_roots(["stdlib-ns"]);

    let packages = resolve(&provider, Path::new("/app"), &ctx(), &skip, false).unwrap();

    assert_eq!(import_paths(&packages), vec!["pkgA", "pkgB"]);
    assert!(!provider.calls.borrow().iter().any(|c| c.starts_with("stdlib-ns")));
  }

  #[test]
  fn cycles_terminate() {
    let provider = FakeProvider::new("main", &["a"])
      .with("a", &["b"])
      .with("b", &["c"])
      .with("c", &["a"]);

    let packages = resolve(&provider, Path::new("/app"), &ctx(), &SkipList::standard(), true).unwrap();

    assert_eq!(import_paths(&packages), vec!["a", "b", "c"]);
  }

  #[test]
  fn diamond_is_deduplicated() {
    let provider = FakeProvider::new("main", &["left", "right"])
      .with("left", &["shared", "fmt"])
      .with("right", &["shared", "net/http"])
      .with("shared", &[]);

    let packages = resolve(&provider, Path::new("/app"), &ctx(), &SkipList::standard(), true).unwrap();

    assert_eq!(import_paths(&packages), vec!["left", "right", "shared"]);
  }

  #[test]
  fn distinct_import_paths_to_one_physical_package() {
    let provider = FakeProvider::new("main", &["pkg", "mirror/pkg"])
      .with("pkg", &[])
      .alias("mirror/pkg", "pkg");

    let packages = resolve(&provider, Path::new("/app"), &ctx(), &SkipList::standard(), true).unwrap();

    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].dir, PathBuf::from("/gopath/src/pkg"));
  }

  #[test]
  fn library_root_rejected_before_any_import() {
    let provider = FakeProvider::new("lib", &["a"]).with("a", &[]);

    let err = resolve(&provider, Path::new("/app"), &ctx(), &SkipList::standard(), true).unwrap_err();

    match err {
      ResolveError::NotAnEntryPoint { name, .. } => assert_eq!(name, "lib"),
      other => panic!("unexpected error: {other}"),
    }
    assert!(provider.calls.borrow().is_empty());
  }

  #[test]
  fn library_root_allowed_when_not_required() {
    let provider = FakeProvider::new("lib", &["a"]).with("a", &[]);

    let packages = resolve(&provider, Path::new("/app"), &ctx(), &SkipList::standard(), false).unwrap();

    assert_eq!(import_paths(&packages), vec!["a"]);
  }

  #[test]
  fn unresolvable_import_fails_whole_run() {
    let provider = FakeProvider::new("main", &["a"]).with("a", &["missing"]);

    let err = resolve(&provider, Path::new("/app"), &ctx(), &SkipList::standard(), true).unwrap_err();

    match err {
      ResolveError::ImportResolutionFailed {
        import_path, from_dir, ..
      } => {
        assert_eq!(import_path, "missing");
        assert_eq!(from_dir, PathBuf::from("/gopath/src/a"));
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn unreadable_root_is_package_not_found() {
    let ws = Workspace::new();
    let ctx = BuildContext::new(Vec::<String>::new(), 9, vec![ws.root()]);

    let err = resolve(&GoProvider::new(), &ws.root().join("nowhere"), &ctx, &SkipList::standard(), false).unwrap_err();

    assert!(matches!(err, ResolveError::PackageNotFound { .. }));
  }

  #[test]
  fn resolves_real_workspace() {
    let ws = Workspace::new();
    let app = ws.package("example.com/app", "main", &["fmt", "example.com/a", "appengine"]);
    ws.package("example.com/a", "a", &["example.com/b", "example.com/app/vendor/never"]);
    ws.package("example.com/b", "b", &["example.com/a", "strings"]);
    ws.package("example.com/app/vendor/never", "never", &[]);
    let ctx = BuildContext::new(["appengine"], 9, vec![ws.root()]);

    let packages = resolve(&GoProvider::new(), &app, &ctx, &SkipList::legacy_standard(), true).unwrap();

    assert_eq!(
      import_paths(&packages),
      vec!["example.com/a", "example.com/app/vendor/never", "example.com/b"]
    );
    for pkg in &packages {
      assert_eq!(pkg.source_root, ws.root().join("src"));
      assert_eq!(pkg.dir, ws.root().join("src").join(&pkg.import_path));
    }
  }
}
