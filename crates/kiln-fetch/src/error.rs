use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request to '{url}' failed: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("download cancelled")]
    Cancelled,

    #[error("failed to write download to '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Fs(#[from] kiln_fs::Error),

    #[error(transparent)]
    Platform(#[from] kiln_platform::Error),
}

impl From<kiln_progress::Cancelled> for Error {
    fn from(_: kiln_progress::Cancelled) -> Self {
        Error::Cancelled
    }
}

impl Error {
    pub(crate) fn network(
        url: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Network {
            url: url.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
