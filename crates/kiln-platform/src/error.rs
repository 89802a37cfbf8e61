use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no engine build is published for platform {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },
}
