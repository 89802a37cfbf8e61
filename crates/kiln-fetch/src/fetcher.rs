use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use kiln_platform::InstallLayout;
use kiln_progress::{CancelToken, ProgressChannel};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::http::{HttpClient, RemoteBody};
use crate::remote::RemoteLayout;

pub const CHECKSUM_TASK: &str = "Downloading checksum";
pub const ARCHIVE_TASK: &str = "Downloading engine";

/// Downloads the checksum and archive for one platform into an install root.
///
/// The archive is streamed to a `.part` staging file and renamed into place
/// only once the body has been fully written, so a visible
/// `{platform}.tar.gz` is always complete.
pub struct ArchiveFetcher<C> {
    client: C,
    remote: RemoteLayout,
    layout: InstallLayout,
}

impl<C: HttpClient> ArchiveFetcher<C> {
    pub fn new(client: C, remote: RemoteLayout, layout: InstallLayout) -> Self {
        Self {
            client,
            remote,
            layout,
        }
    }

    pub fn remote(&self) -> &RemoteLayout {
        &self.remote
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Fetch the remote checksum and compare it with the cached one.
    ///
    /// Returns `true` when both are byte-identical; the cached file is then
    /// left untouched. Otherwise the install marker is written, the fresh
    /// checksum replaces the cache and `false` is returned. The marker keeps
    /// the old tree untrusted until a reinstall clears it.
    pub async fn fetch_checksum(
        &self,
        progress: &ProgressChannel,
        cancel: &CancelToken,
    ) -> Result<bool> {
        let platform = self.layout.platform();
        platform.require_supported()?;
        progress.begin_task(CHECKSUM_TASK);

        let url = self.remote.checksum_url(&platform);
        let temp = self.layout.checksum_temp();
        let cached = self.layout.checksum();
        kiln_fs::ensure_dir(self.layout.root())?;

        if let Err(err) = self.download(&url, &temp, progress, cancel).await {
            discard(&temp);
            return Err(err);
        }

        let cached_exists = cached
            .try_exists()
            .map_err(|source| kiln_fs::Error::Read {
                path: cached.clone(),
                source,
            })?;
        if cached_exists && kiln_fs::same_content(&cached, &temp)? {
            kiln_fs::remove_file_if_exists(&temp)?;
            info!(platform = %platform, "checksum unchanged");
            return Ok(true);
        }

        if let Err(err) = kiln_fs::atomic_write(self.layout.install_marker(), platform.name().as_bytes()) {
            discard(&temp);
            return Err(err.into());
        }
        kiln_fs::replace_file(&temp, &cached)?;
        info!(platform = %platform, cached = cached_exists, "checksum changed");
        Ok(false)
    }

    /// Stream the archive to its staging file and move it into place.
    pub async fn fetch_archive(
        &self,
        progress: &ProgressChannel,
        cancel: &CancelToken,
    ) -> Result<PathBuf> {
        let platform = self.layout.platform();
        platform.require_supported()?;
        progress.begin_task(ARCHIVE_TASK);

        let url = self.remote.archive_url(&platform);
        let staging = self.layout.archive_staging();
        let dest = self.layout.archive();
        kiln_fs::ensure_dir(self.layout.root())?;

        info!(url = %url, path = %dest.display(), "downloading engine archive");
        let bytes = match self.download(&url, &staging, progress, cancel).await {
            Ok(bytes) => bytes,
            Err(err) => {
                discard(&staging);
                return Err(err);
            }
        };

        if let Err(err) = kiln_fs::replace_file(&staging, &dest) {
            discard(&staging);
            return Err(err.into());
        }
        info!(path = %dest.display(), bytes, "engine archive downloaded");
        Ok(dest)
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &ProgressChannel,
        cancel: &CancelToken,
    ) -> Result<u64> {
        cancel.check()?;
        debug!(url, path = %dest.display(), "GET");

        let RemoteBody {
            content_length,
            mut stream,
        } = self
            .client
            .get(url)
            .await
            .map_err(|err| Error::network(url, err))?;

        let total = content_length.filter(|len| *len > 0);
        if total.is_none() {
            progress.set_indeterminate();
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|source| Error::write(dest, source))?;
        let mut read: u64 = 0;

        while let Some(chunk) = stream.next().await {
            cancel.check()?;
            let chunk = chunk.map_err(|err| Error::network(url, err))?;
            file.write_all(&chunk)
                .await
                .map_err(|source| Error::write(dest, source))?;
            read += chunk.len() as u64;
            if let Some(total) = total {
                progress.set_fraction(read as f32 / total as f32);
            }
        }

        file.flush()
            .await
            .map_err(|source| Error::write(dest, source))?;
        file.sync_all()
            .await
            .map_err(|source| Error::write(dest, source))?;

        match total {
            Some(total) if read < total => {
                return Err(Error::network(
                    url,
                    io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("body ended after {read} of {total} bytes"),
                    ),
                ));
            }
            Some(total) if read > total => {
                warn!(url, expected = total, bytes = read, "body longer than advertised");
            }
            _ => {}
        }
        progress.set_fraction(1.0);
        Ok(read)
    }
}

fn discard(path: &Path) {
    if let Err(err) = kiln_fs::remove_file_if_exists(path) {
        warn!(path = %path.display(), error = %err, "failed to remove partial download");
    }
}
