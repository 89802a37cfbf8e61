//! Operating system family detection.

use std::fmt;

/// Operating system families the engine bundle is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Macos,
    Windows,
    Unknown,
}

impl Os {
    /// Map a raw OS identifier (as reported by the compile target) to a family.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "linux" => Os::Linux,
            "macos" | "darwin" | "osx" => Os::Macos,
            "windows" | "win32" => Os::Windows,
            _ => Os::Unknown,
        }
    }

    /// Segment used in the normalized platform name.
    pub fn as_str(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Macos => "macos",
            Os::Windows => "windows",
            Os::Unknown => "unknown",
        }
    }

    /// Whether helper binaries need POSIX permission bits.
    pub fn is_posix(self) -> bool {
        matches!(self, Os::Linux | Os::Macos)
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the operating system family of the running process.
pub fn detect() -> Os {
    Os::from_raw(std::env::consts::OS)
}
