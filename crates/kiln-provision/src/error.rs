use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("provisioning is already running")]
    AlreadyRunning,

    #[error("provisioning cannot block inside an async runtime; use `spawn` instead")]
    InsideRuntime,

    #[error("provisioning cancelled")]
    Cancelled,

    #[error(transparent)]
    Platform(#[from] kiln_platform::Error),

    #[error(transparent)]
    Config(#[from] kiln_config::Error),

    #[error(transparent)]
    Fetch(#[from] kiln_fetch::Error),

    #[error(transparent)]
    Archive(#[from] kiln_archive::Error),

    #[error(transparent)]
    Fs(#[from] kiln_fs::Error),

    #[error("failed to start the provisioning runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("failed to spawn the provisioning thread: {0}")]
    Spawn(#[source] io::Error),
}

impl From<kiln_progress::Cancelled> for Error {
    fn from(_: kiln_progress::Cancelled) -> Self {
        Error::Cancelled
    }
}

impl Error {
    /// Whether the run stopped because its cancel token fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Error::Cancelled
                | Error::Fetch(kiln_fetch::Error::Cancelled)
                | Error::Archive(kiln_archive::Error::Cancelled)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
