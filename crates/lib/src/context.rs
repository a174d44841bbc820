//! Build context and skip list.
//!
//! Both values are built once per staging run by the mode selector and only
//! read afterwards. The [`BuildContext`] decides which source files of a
//! package take part in the build; the [`SkipList`] decides which import
//! paths are provided by the runtime and never staged.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::consts::{COMPILER, WORKSPACE_SRC_DIR};
use crate::platform::Platform;

/// Target description used when reading package sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
  platform: Platform,
  compiler: String,
  cgo_enabled: bool,
  build_tags: BTreeSet<String>,
  release_tags: Vec<String>,
  workspace_roots: Vec<PathBuf>,
}

impl BuildContext {
  /// Create a context for the hosted platform.
  ///
  /// Release tags run from `go1.1` up to `go1.{minor_version}`. Each workspace
  /// root resolves import paths under its `src` subdirectory.
  pub fn new<I, S>(build_tags: I, minor_version: u32, workspace_roots: Vec<PathBuf>) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      platform: Platform::hosted(),
      compiler: COMPILER.to_string(),
      cgo_enabled: false,
      build_tags: build_tags.into_iter().map(Into::into).collect(),
      release_tags: (1..=minor_version).map(|i| format!("go1.{i}")).collect(),
      workspace_roots,
    }
  }

  pub fn platform(&self) -> Platform {
    self.platform
  }

  pub fn build_tags(&self) -> &BTreeSet<String> {
    &self.build_tags
  }

  pub fn release_tags(&self) -> &[String] {
    &self.release_tags
  }

  pub fn workspace_roots(&self) -> &[PathBuf] {
    &self.workspace_roots
  }

  /// Source directories (`<root>/src`) in search order.
  pub fn source_roots(&self) -> impl Iterator<Item = PathBuf> + '_ {
    self.workspace_roots.iter().map(|root| root.join(WORKSPACE_SRC_DIR))
  }

  /// Find the source root containing `dir`, returning it with the import path of `dir`.
  ///
  /// `dir` must be absolute. A source root itself has no import path and does not match.
  pub fn locate(&self, dir: &Path) -> Option<(PathBuf, String)> {
    self.source_roots().find_map(|src| {
      let rel = dir.strip_prefix(&src).ok()?;
      if rel.as_os_str().is_empty() {
        return None;
      }
      let import_path = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
      Some((src, import_path))
    })
  }

  /// Whether a single build tag is satisfied by this context.
  pub fn matches_tag(&self, tag: &str) -> bool {
    if tag == self.platform.os.as_str() || tag == self.platform.arch.as_str() || tag == self.compiler {
      return true;
    }
    if tag == "cgo" {
      return self.cgo_enabled;
    }
    self.build_tags.contains(tag) || self.release_tags.iter().any(|r| r == tag)
  }
}

/// Top-level import path segments served by the standard library.
const STANDARD_LIBRARY_ROOTS: &[&str] = &[
  "archive",
  "bufio",
  "builtin",
  "bytes",
  "cmp",
  "compress",
  "container",
  "context",
  "crypto",
  "database",
  "debug",
  "embed",
  "encoding",
  "errors",
  "expvar",
  "flag",
  "fmt",
  "go",
  "hash",
  "html",
  "image",
  "index",
  "io",
  "iter",
  "log",
  "maps",
  "math",
  "mime",
  "net",
  "os",
  "path",
  "plugin",
  "reflect",
  "regexp",
  "runtime",
  "slices",
  "sort",
  "strconv",
  "strings",
  "structs",
  "sync",
  "syscall",
  "testing",
  "text",
  "time",
  "unicode",
  "unique",
  "weak",
];

/// Pseudo-packages and platform internals that are always present at build time.
const BUILTIN_ROOTS: &[&str] = &["C", "unsafe", "appengine_internal"];

/// The first-party platform API, provided by the legacy standard runtime only.
const PLATFORM_API_ROOT: &str = "appengine";

/// Immutable set of leading import path segments that are never resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipList {
  roots: BTreeSet<String>,
}

impl SkipList {
  /// Skip list for runtimes that do not provide the platform API package.
  pub fn standard() -> Self {
    Self::from_roots(STANDARD_LIBRARY_ROOTS.iter().chain(BUILTIN_ROOTS).copied())
  }

  /// Skip list for the legacy standard runtime, which also provides the platform API.
  pub fn legacy_standard() -> Self {
    Self::from_roots(
      STANDARD_LIBRARY_ROOTS
        .iter()
        .chain(BUILTIN_ROOTS)
        .copied()
        .chain(std::iter::once(PLATFORM_API_ROOT)),
    )
  }

  /// Build a skip list from explicit roots.
  pub fn from_roots<I, S>(roots: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      roots: roots.into_iter().map(Into::into).collect(),
    }
  }

  /// Whether the leading segment of `import_path` is on the list.
  pub fn skips(&self, import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or(import_path);
    self.roots.contains(first)
  }
}
