//! Layered settings: built-in defaults, then a TOML file, then `KILN_*`
//! environment variables.

pub use error::{Error, Result};
pub use settings::{DEFAULT_MIRROR, DEFAULT_PREFIX, DEFAULT_SCHEME, ENV_PREFIX, Settings};

mod error;
mod settings;
