use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to rename '{from}' to '{to}': {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("failed to remove '{path}': {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to set permissions on '{path}': {source}")]
    Permissions { path: PathBuf, source: io::Error },
}

impl Error {
    /// Whether the underlying I/O error was `NotFound`.
    pub fn is_not_found(&self) -> bool {
        let source = match self {
            Error::Read { source, .. }
            | Error::Write { source, .. }
            | Error::Rename { source, .. }
            | Error::Remove { source, .. }
            | Error::Permissions { source, .. } => source,
        };
        source.kind() == io::ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, Error>;
