//! Names and fixed values shared across the staging pipeline.

/// Entries never copied into a staged tree (version-control metadata and CI config).
pub const EXCLUDED_ENTRIES: &[&str] = &[".git", ".gitconfig", ".hg", ".travis.yml"];

/// Subdirectory of a workspace root that holds package sources.
pub const WORKSPACE_SRC_DIR: &str = "src";

/// Directory name searched for vendored packages.
pub const VENDOR_DIR: &str = "vendor";

/// Module manifest marker file.
pub const MODULE_MANIFEST: &str = "go.mod";

/// Staged directory holding the bundled workspace for flexible deployments.
pub const STAGED_GOPATH_DIR: &str = "_gopath";

/// Side file (inside [`STAGED_GOPATH_DIR`]) naming the main package's workspace-relative path.
pub const MAIN_PACKAGE_PATH_FILE: &str = "main-package-path";

/// Side file (at the staged root) naming the main package's module-relative path.
pub const MODULE_MAIN_PACKAGE_PATH_FILE: &str = "_main-package-path";

/// Default catalog of flexible runtime targets.
pub const DEFAULT_RUNTIMES_URL: &str = "http://storage.googleapis.com/runtime-builders/runtimes.yaml";

/// Minor version used when legacy standard declares the unpinned `go1` API version.
pub const STANDARD_DEFAULT_MINOR_VERSION: u32 = 9;

/// Compiler name matched by build constraints.
pub const COMPILER: &str = "gc";
