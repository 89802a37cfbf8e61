use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use kiln_platform::InstallLayout;

use crate::cli::{load_settings, local_layout};

#[derive(Args, Clone, Debug, Default)]
pub struct CleanArg {
    /// Keep the cached checksum so an unchanged remote is not refetched.
    #[arg(long)]
    pub keep_checksum: bool,
}

pub fn clean(config: Option<&Path>, arg: CleanArg) -> Result<()> {
    let settings = load_settings(config)?;
    let layout = local_layout(&settings);

    let removed = remove_artifacts(&layout, arg.keep_checksum)?;
    if removed.is_empty() {
        println!("nothing to clean in {}", layout.root().display());
    }
    for path in removed {
        println!("removed {}", path.display());
    }
    Ok(())
}

fn remove_artifacts(layout: &InstallLayout, keep_checksum: bool) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    let tree = layout.install_dir();
    if kiln_fs::remove_dir_if_exists(&tree)? {
        removed.push(tree);
    }

    let mut files = vec![layout.archive(), layout.archive_staging(), layout.install_marker()];
    if !keep_checksum {
        files.extend([layout.checksum(), layout.checksum_temp()]);
    }
    for file in files {
        if kiln_fs::remove_file_if_exists(&file)? {
            removed.push(file);
        }
    }
    Ok(removed)
}
