use std::path::{Path, PathBuf};

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("USERPROFILE").filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> Option<PathBuf> {
  std::env::var_os("HOME").filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Returns the ordered workspace roots packages are resolved under.
///
/// Reads `GOPATH` (a platform path list) when set and non-empty, otherwise
/// falls back to `$HOME/go`. Empty list entries are dropped and relative
/// entries are made absolute against the current directory.
pub fn workspace_roots() -> Vec<PathBuf> {
  let roots: Vec<PathBuf> = match std::env::var_os("GOPATH").filter(|v| !v.is_empty()) {
    Some(list) => std::env::split_paths(&list)
      .filter(|p| !p.as_os_str().is_empty())
      .collect(),
    None => home_dir().map(|home| vec![home.join("go")]).unwrap_or_default(),
  };

  roots.into_iter().map(|p| absolute(&p)).collect()
}

/// Make `path` absolute without resolving symlinks.
///
/// Falls back to the path unchanged if the current directory is unavailable.
pub fn absolute(path: &Path) -> PathBuf {
  std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Render a relative path with forward slashes regardless of host conventions.
pub fn to_slash(path: &Path) -> String {
  let joined = path
    .components()
    .map(|c| c.as_os_str().to_string_lossy().into_owned())
    .collect::<Vec<_>>()
    .join("/");
  if joined.is_empty() { ".".to_string() } else { joined }
}
