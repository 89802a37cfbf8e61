//! Gzip-tar extraction for engine bundles.
//!
//! [`extract`] streams a `.tar.gz` into an install root with every entry name
//! sanitized against the root, reporting an estimated fraction through a
//! [`kiln_progress::ProgressChannel`].

pub use error::{Error, Result};
pub use installer::{EXTRACT_TASK, ExtractReport, extract};
pub use options::{DEFAULT_COMPRESSION_RATIO, ExtractOptions, ProgressBasis};

mod error;
mod installer;
mod options;
pub mod sanitize;
