use std::fmt;

/// Operating system a staged app targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
}

impl Os {
  /// Returns the Go toolchain identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Every OS name the Go toolchain recognizes in file name suffixes and build tags.
pub const KNOWN_OS: &[&str] = &[
  "aix",
  "android",
  "darwin",
  "dragonfly",
  "freebsd",
  "hurd",
  "illumos",
  "ios",
  "js",
  "linux",
  "nacl",
  "netbsd",
  "openbsd",
  "plan9",
  "solaris",
  "wasip1",
  "windows",
  "zos",
];

/// Returns true if `name` is a recognized OS identifier
pub fn is_known_os(name: &str) -> bool {
  KNOWN_OS.contains(&name)
}
