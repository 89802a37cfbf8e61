use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open archive '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("archive '{path}' is corrupted: {source}")]
    Corrupted { path: PathBuf, source: io::Error },

    #[error("entry '{entry}' escapes the install root")]
    PathEscape { entry: PathBuf },

    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("extraction cancelled")]
    Cancelled,

    #[error(transparent)]
    Fs(#[from] kiln_fs::Error),
}

impl From<kiln_progress::Cancelled> for Error {
    fn from(_: kiln_progress::Cancelled) -> Self {
        Error::Cancelled
    }
}

pub type Result<T> = std::result::Result<T, Error>;
