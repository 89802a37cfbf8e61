//! Checksum-gated streaming download of engine archives.
//!
//! [`ArchiveFetcher`] pulls `{platform}.tar.gz.sha256` and, when asked,
//! `{platform}.tar.gz` from a mirror described by [`RemoteLayout`]. Bodies
//! are streamed chunk by chunk to disk and never buffered whole.

pub use error::{Error, Result};
pub use fetcher::{ARCHIVE_TASK, ArchiveFetcher, CHECKSUM_TASK};
pub use http::{BoxStream, HttpClient, RemoteBody};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
pub use remote::{DEFAULT_HOST, DEFAULT_PREFIX, RemoteLayout};

mod error;
mod fetcher;
mod http;
mod remote;
