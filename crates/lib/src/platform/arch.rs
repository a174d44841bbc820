use std::fmt;

/// CPU architecture a staged app targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
  Amd64,
}

impl Arch {
  /// Returns the Go toolchain identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Amd64 => "amd64",
    }
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Every architecture name the Go toolchain recognizes in file name suffixes and build tags.
pub const KNOWN_ARCH: &[&str] = &[
  "386",
  "amd64",
  "amd64p32",
  "arm",
  "armbe",
  "arm64",
  "arm64be",
  "loong64",
  "mips",
  "mipsle",
  "mips64",
  "mips64le",
  "mips64p32",
  "mips64p32le",
  "ppc",
  "ppc64",
  "ppc64le",
  "riscv",
  "riscv64",
  "s390",
  "s390x",
  "sparc",
  "sparc64",
  "wasm",
];

/// Returns true if `name` is a recognized architecture identifier
pub fn is_known_arch(name: &str) -> bool {
  KNOWN_ARCH.contains(&name)
}
