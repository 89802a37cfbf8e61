use std::path::Path;

use crate::{Error, Result};

/// Permission modes applied to files inside an install root.
///
/// On Windows only the `readonly` attribute is touched, and every mode
/// except `Inherit` clears it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Leave whatever the process umask produced.
    #[default]
    Inherit,

    /// `0o700` (rwx------). Runnable by the owning user only.
    OwnerExecutable,

    /// Explicit Unix mode bits.
    Custom(u32),
}

impl PermissionMode {
    /// Get the Unix mode bits, or `None` for `Inherit`.
    pub fn to_unix_mode(self) -> Option<u32> {
        match self {
            Self::Inherit => None,
            Self::OwnerExecutable => Some(0o700),
            Self::Custom(mode) => Some(mode),
        }
    }

    /// Apply the permission mode to a file or directory path.
    pub fn apply_to_path(self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let Some(mode) = self.to_unix_mode() else {
                return Ok(());
            };
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
                Error::Permissions {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }

        #[cfg(not(unix))]
        {
            if self == Self::Inherit {
                return Ok(());
            }
            let mut perms = std::fs::metadata(path)
                .map_err(|e| Error::Permissions {
                    path: path.to_path_buf(),
                    source: e,
                })?
                .permissions();
            perms.set_readonly(false);
            std::fs::set_permissions(path, perms).map_err(|e| Error::Permissions {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        Ok(())
    }
}
