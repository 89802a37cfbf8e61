use std::cell::Cell;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use flate2::read::GzDecoder;
use kiln_progress::{CancelToken, ProgressChannel};
use tar::EntryType;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::options::ExtractOptions;
use crate::sanitize;

pub const EXTRACT_TASK: &str = "Extracting";

const CHUNK_SIZE: usize = 64 * 1024;

/// Summary of a finished extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub files: usize,
    pub directories: usize,
    pub links: usize,
    pub skipped: usize,
    /// Uncompressed bytes written.
    pub bytes: u64,
    pub archive_size: u64,
}

/// Counts bytes pulled from the compressed source.
struct CountingReader<R> {
    inner: R,
    count: Rc<Cell<u64>>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.set(self.count.get() + n as u64);
        Ok(n)
    }
}

/// Extract a gzip-compressed tar archive under `root`.
///
/// Entries are streamed to disk in bounded chunks. Progress is reported under
/// the `"Extracting"` task and forced to exactly `1.0` once every entry is
/// written. On error the tree under `root` is left as far as it got.
pub fn extract(
    archive: &Path,
    root: &Path,
    options: &ExtractOptions,
    progress: &ProgressChannel,
    cancel: &CancelToken,
) -> Result<ExtractReport> {
    progress.begin_task(EXTRACT_TASK);
    cancel.check()?;

    let file = File::open(archive).map_err(|source| Error::Open {
        path: archive.to_path_buf(),
        source,
    })?;
    let archive_size = file
        .metadata()
        .map_err(|source| Error::Open {
            path: archive.to_path_buf(),
            source,
        })?
        .len();
    kiln_fs::ensure_dir(root)?;

    if archive_size == 0 {
        progress.set_indeterminate();
    }
    info!(path = %archive.display(), bytes = archive_size, "extracting engine archive");

    let report = {
        let consumed = Rc::new(Cell::new(0));
        let reader = CountingReader {
            inner: BufReader::new(file),
            count: Rc::clone(&consumed),
        };
        let mut tar = tar::Archive::new(GzDecoder::new(reader));
        let mut run = Extraction {
            archive,
            root,
            options,
            progress,
            cancel,
            consumed,
            report: ExtractReport {
                archive_size,
                ..ExtractReport::default()
            },
        };
        run.entries(&mut tar)?;
        run.report
    };

    if options.delete_source {
        kiln_fs::remove_file_if_exists(archive)?;
        debug!(path = %archive.display(), "archive removed");
    }

    progress.set_fraction(1.0);
    info!(
        files = report.files,
        links = report.links,
        bytes = report.bytes,
        "extraction finished"
    );
    Ok(report)
}

struct Extraction<'a> {
    archive: &'a Path,
    root: &'a Path,
    options: &'a ExtractOptions,
    progress: &'a ProgressChannel,
    cancel: &'a CancelToken,
    consumed: Rc<Cell<u64>>,
    report: ExtractReport,
}

impl Extraction<'_> {
    fn entries<R: Read>(&mut self, tar: &mut tar::Archive<R>) -> Result<()> {
        let entries = tar.entries().map_err(|err| self.corrupted(err))?;
        for entry in entries {
            self.cancel.check()?;
            let mut entry = entry.map_err(|err| self.corrupted(err))?;
            let raw = entry.path().map_err(|err| self.corrupted(err))?.into_owned();
            let Some(relative) = sanitize::entry_path(&raw)? else {
                continue;
            };
            let dest = self.root.join(&relative);

            match entry.header().entry_type() {
                EntryType::Regular | EntryType::Continuous => {
                    self.write_file(&mut entry, &dest)?;
                    self.report.files += 1;
                    if self.options.preserve_permissions {
                        let mode = entry.header().mode().map_err(|err| self.corrupted(err))?;
                        apply_mode(&dest, mode)?;
                    }
                }
                EntryType::Directory => {
                    create_dir(&dest)?;
                    self.report.directories += 1;
                }
                EntryType::Symlink => {
                    let target = entry
                        .link_name()
                        .map_err(|err| self.corrupted(err))?
                        .map(|t| t.into_owned());
                    match target {
                        Some(target) => {
                            sanitize::symlink_target(&relative, &target)?;
                            if self.symlink(&target, &dest)? {
                                self.report.links += 1;
                            } else {
                                self.report.skipped += 1;
                            }
                        }
                        None => self.report.skipped += 1,
                    }
                }
                EntryType::Link => {
                    let target = entry
                        .link_name()
                        .map_err(|err| self.corrupted(err))?
                        .map(|t| t.into_owned());
                    let Some(target) = target else {
                        self.report.skipped += 1;
                        continue;
                    };
                    let Some(source) = sanitize::entry_path(&target)? else {
                        return Err(Error::PathEscape { entry: raw });
                    };
                    self.hard_link(&self.root.join(source), &dest)?;
                    self.report.links += 1;
                }
                other => {
                    debug!(entry = %raw.display(), kind = ?other, "skipping entry");
                    self.report.skipped += 1;
                }
            }
        }
        Ok(())
    }

    fn write_file<R: Read>(&mut self, entry: &mut R, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            create_dir(parent)?;
        }
        debug!(path = %dest.display(), "extracting file");
        let mut out = File::create(dest).map_err(|source| extraction_failed(dest, source))?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = entry.read(&mut buf).map_err(|err| self.corrupted(err))?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])
                .map_err(|source| extraction_failed(dest, source))?;
            self.report.bytes += n as u64;
            self.publish();
            self.cancel.check()?;
        }
        out.flush().map_err(|source| extraction_failed(dest, source))
    }

    #[cfg(unix)]
    fn symlink(&self, target: &Path, dest: &Path) -> Result<bool> {
        if let Some(parent) = dest.parent() {
            create_dir(parent)?;
        }
        replace_existing(dest)?;
        std::os::unix::fs::symlink(target, dest).map_err(|source| extraction_failed(dest, source))?;
        debug!(path = %dest.display(), target = %target.display(), "created symlink");
        Ok(true)
    }

    #[cfg(not(unix))]
    fn symlink(&self, target: &Path, dest: &Path) -> Result<bool> {
        warn!(path = %dest.display(), target = %target.display(), "symlinks unsupported here, skipping");
        Ok(false)
    }

    fn hard_link(&self, source: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            create_dir(parent)?;
        }
        replace_existing(dest)?;
        if fs::hard_link(source, dest).is_err() {
            fs::copy(source, dest).map_err(|err| extraction_failed(dest, err))?;
        }
        Ok(())
    }

    fn publish(&self) {
        if self.report.archive_size == 0 {
            return;
        }
        self.progress.set_fraction(self.options.fraction(
            self.report.bytes,
            self.consumed.get(),
            self.report.archive_size,
        ));
    }

    fn corrupted(&self, source: io::Error) -> Error {
        Error::Corrupted {
            path: self.archive.to_path_buf(),
            source,
        }
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn replace_existing(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            warn!(path = %path.display(), "link would replace a directory");
            Err(extraction_failed(
                path,
                io::Error::new(io::ErrorKind::AlreadyExists, "directory in the way"),
            ))
        }
        Ok(_) => kiln_fs::remove_file_if_exists(path).map(drop).map_err(Error::from),
        Err(_) => Ok(()),
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> Result<()> {
    kiln_fs::PermissionMode::Custom(mode & 0o755).apply_to_path(path)?;
    Ok(())
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

fn extraction_failed(path: &Path, source: io::Error) -> Error {
    Error::ExtractionFailed {
        path: PathBuf::from(path),
        source,
    }
}
