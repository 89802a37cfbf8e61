use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::{load_settings, local_layout};

pub fn status(config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    let layout = local_layout(&settings);

    println!("platform       {}", layout.platform());
    println!(
        "engine version {}",
        settings.engine_version().unwrap_or("<unset>")
    );
    println!("install root   {}", layout.root().display());
    println!(
        "install tree   {}",
        if layout.install_dir().is_dir() {
            "present"
        } else {
            "missing"
        }
    );
    match cached_checksum(&layout.checksum())? {
        Some(digest) => println!("checksum       {digest}"),
        None => println!("checksum       <none>"),
    }
    if layout.install_marker().exists() {
        println!("note: the last provisioning run did not finish; the next one reinstalls");
    }
    if layout.archive_staging().exists() {
        println!("note: an interrupted download is left at {}", layout.archive_staging().display());
    }
    Ok(())
}

pub fn platform() {
    let tag = kiln_platform::resolve();
    println!("{}", tag.name());
    println!("os             {}", tag.os());
    println!("arch           {}", tag.arch());
    println!("supported      {}", tag.is_supported());
}

/// First token of the checksum sidecar, if one was cached.
fn cached_checksum(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content.split_whitespace().next().map(str::to_string)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("could not read {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_sidecar_is_optional() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("linux_amd64.tar.gz.sha256");
        assert_eq!(cached_checksum(&path).unwrap(), None);

        std::fs::write(&path, "9f86d081884c7d65  linux_amd64.tar.gz\n").unwrap();
        assert_eq!(
            cached_checksum(&path).unwrap().as_deref(),
            Some("9f86d081884c7d65")
        );
    }

    #[test]
    fn empty_sidecar_has_no_digest() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.sha256");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(cached_checksum(&path).unwrap(), None);
    }
}
