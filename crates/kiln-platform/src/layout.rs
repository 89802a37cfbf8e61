//! On-disk layout of an install root.
//!
//! ```text
//! <root>/
//!   <platform>.tar.gz              transient archive
//!   <platform>.tar.gz.part         download staging file
//!   <platform>.tar.gz.sha256       cached remote checksum
//!   <platform>.tar.gz.sha256.temp  freshly fetched checksum
//!   <platform>.installing          set while the tree is being replaced
//!   <platform>/                    extracted engine tree
//! ```

use std::path::{Path, PathBuf};

use crate::tag::PlatformTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
    platform: PlatformTag,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>, platform: PlatformTag) -> Self {
        Self {
            root: root.into(),
            platform,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platform(&self) -> PlatformTag {
        self.platform
    }

    pub fn archive_file_name(&self) -> String {
        format!("{}.tar.gz", self.platform.name())
    }

    pub fn archive(&self) -> PathBuf {
        self.root.join(self.archive_file_name())
    }

    pub fn archive_staging(&self) -> PathBuf {
        self.root.join(format!("{}.part", self.archive_file_name()))
    }

    pub fn checksum(&self) -> PathBuf {
        self.root.join(format!("{}.sha256", self.archive_file_name()))
    }

    pub fn checksum_temp(&self) -> PathBuf {
        self.root.join(format!("{}.sha256.temp", self.archive_file_name()))
    }

    /// Present while the engine tree is out of date with the cached
    /// checksum. A tree is only trusted when this file is absent.
    pub fn install_marker(&self) -> PathBuf {
        self.root.join(format!("{}.installing", self.platform.name()))
    }

    /// Directory holding the extracted engine tree.
    pub fn install_dir(&self) -> PathBuf {
        self.root.join(self.platform.name())
    }

    pub fn helper_executables(&self) -> Vec<PathBuf> {
        let dir = self.install_dir();
        self.platform
            .helper_executables()
            .into_iter()
            .map(|rel| dir.join(rel))
            .collect()
    }
}
