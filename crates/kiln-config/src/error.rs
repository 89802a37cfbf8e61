#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Figment(#[from] figment::Error),

    #[error("no engine version configured; set `engine_version` or KILN_ENGINE_VERSION")]
    MissingVersion,

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
