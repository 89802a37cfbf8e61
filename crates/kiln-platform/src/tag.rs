//! Normalized platform tag used for remote archive selection and local layout.

use std::fmt;
use std::path::PathBuf;

use once_cell::sync::Lazy;

use crate::arch::{self, Arch};
use crate::error::{Error, Result};
use crate::os::{self, Os};

/// Name used for every platform without a published engine build.
pub const UNSUPPORTED: &str = "unsupported";

static CURRENT: Lazy<PlatformTag> = Lazy::new(|| PlatformTag::new(os::detect(), arch::detect()));

/// Immutable OS + architecture pair with its normalized name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformTag {
    os: Os,
    arch: Arch,
}

impl PlatformTag {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Build a tag from raw OS/arch identifiers. Pure: the same input always
    /// yields the same tag.
    pub fn from_parts(os: &str, arch: &str) -> Self {
        Self::new(Os::from_raw(os), Arch::from_raw(arch))
    }

    pub fn os(&self) -> Os {
        self.os
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self.os, Os::Unknown) && matches!(self.arch, Arch::Amd64 | Arch::Arm64)
    }

    /// Normalized name, e.g. `linux-amd64`. Doubles as the remote path
    /// segment and the local directory name.
    pub fn name(&self) -> &'static str {
        match (self.os, self.arch) {
            (Os::Linux, Arch::Amd64) => "linux-amd64",
            (Os::Linux, Arch::Arm64) => "linux-arm64",
            (Os::Macos, Arch::Amd64) => "macos-amd64",
            (Os::Macos, Arch::Arm64) => "macos-arm64",
            (Os::Windows, Arch::Amd64) => "windows-amd64",
            (Os::Windows, Arch::Arm64) => "windows-arm64",
            _ => UNSUPPORTED,
        }
    }

    /// Fail with [`Error::UnsupportedPlatform`] when no build exists.
    pub fn require_supported(&self) -> Result<&Self> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(Error::UnsupportedPlatform {
                os: self.os.to_string(),
                arch: self.arch.to_string(),
            })
        }
    }

    /// Helper executables inside the extracted tree, relative to the
    /// platform directory, that must be runnable by the owning user.
    pub fn helper_executables(&self) -> Vec<PathBuf> {
        match self.os {
            Os::Linux => vec![PathBuf::from("jcef_helper")],
            Os::Macos => {
                let frameworks = PathBuf::from("jcef_app.app/Contents/Frameworks");
                ["jcef Helper", "jcef Helper (GPU)", "jcef Helper (Plugin)", "jcef Helper (Renderer)"]
                    .iter()
                    .map(|name| {
                        frameworks
                            .join(format!("{name}.app"))
                            .join("Contents/MacOS")
                            .join(name)
                    })
                    .collect()
            }
            Os::Windows | Os::Unknown => Vec::new(),
        }
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve the platform of the running process. Detected once per process.
pub fn resolve() -> PlatformTag {
    *CURRENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_deterministic() {
        assert_eq!(resolve(), resolve());
        assert_eq!(resolve().name(), resolve().name());
    }

    #[test]
    fn from_parts_normalizes() {
        assert_eq!(PlatformTag::from_parts("linux", "x86_64").name(), "linux-amd64");
        assert_eq!(PlatformTag::from_parts("macos", "aarch64").name(), "macos-arm64");
        assert_eq!(PlatformTag::from_parts("windows", "x86_64").name(), "windows-amd64");
        assert_eq!(
            PlatformTag::from_parts("linux", "x86_64"),
            PlatformTag::from_parts("Linux", "amd64")
        );
    }

    #[test]
    fn unsupported_platforms_get_explicit_tag() {
        let tag = PlatformTag::from_parts("freebsd", "x86_64");
        assert!(!tag.is_supported());
        assert_eq!(tag.name(), UNSUPPORTED);
        assert!(matches!(tag.require_supported(), Err(Error::UnsupportedPlatform { .. })));

        let tag = PlatformTag::from_parts("linux", "i686");
        assert_eq!(tag.name(), UNSUPPORTED);
    }

    #[test]
    fn helper_executables_per_os() {
        let linux = PlatformTag::from_parts("linux", "x86_64");
        assert_eq!(linux.helper_executables(), vec![PathBuf::from("jcef_helper")]);

        let mac = PlatformTag::from_parts("macos", "arm64");
        let helpers = mac.helper_executables();
        assert_eq!(helpers.len(), 4);
        assert!(helpers.iter().all(|p| p.starts_with("jcef_app.app/Contents/Frameworks")));
        assert!(helpers[1].ends_with("Contents/MacOS/jcef Helper (GPU)"));

        let windows = PlatformTag::from_parts("windows", "x86_64");
        assert!(windows.helper_executables().is_empty());
    }
}
