//! Architecture detection.

use std::fmt;

/// CPU architecture types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    Amd64,
    Arm,
    Arm64,
    Unknown,
}

impl Arch {
    /// Map a raw architecture identifier to a normalized architecture.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "i386" | "i586" | "i686" | "x86" => Arch::X86,
            "x86_64" | "amd64" | "x64" => Arch::Amd64,
            "arm" | "armv7" | "armv7l" => Arch::Arm,
            "aarch64" | "arm64" => Arch::Arm64,
            _ => Arch::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::Amd64 => "amd64",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the architecture the running process was built for.
///
/// The engine bundle is loaded in-process, so it must match the process
/// target rather than the host CPU.
pub fn detect() -> Arch {
    Arch::from_raw(std::env::consts::ARCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_aliases() {
        assert_eq!(Arch::from_raw("x86_64"), Arch::Amd64);
        assert_eq!(Arch::from_raw("AMD64"), Arch::Amd64);
        assert_eq!(Arch::from_raw("aarch64"), Arch::Arm64);
        assert_eq!(Arch::from_raw("arm64"), Arch::Arm64);
        assert_eq!(Arch::from_raw("i686"), Arch::X86);
        assert_eq!(Arch::from_raw("riscv64"), Arch::Unknown);
    }
}
