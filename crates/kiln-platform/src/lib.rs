//! Platform identification and install layout for engine bundles.
//!
//! - [`resolve`] detects the running platform once per process.
//! - [`PlatformTag`] carries the normalized `os-arch` name used both for the
//!   remote archive path and for the local install directory.
//! - [`InstallLayout`] derives every path inside an install root.

pub use error::{Error, Result};
pub use tag::{PlatformTag, UNSUPPORTED, resolve};
pub use layout::InstallLayout;
pub use arch::Arch;
pub use os::Os;

pub mod arch;
pub mod dir;
mod error;
mod layout;
pub mod os;
mod tag;
