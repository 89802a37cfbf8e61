//! Progress reporting between a background worker and polling observers.
//!
//! The worker owns a [`ProgressChannel`] and overwrites the latest
//! [`ProgressSnapshot`]; hosts hold [`ProgressObserver`]s and read it once
//! per tick. There is no backpressure: only the newest value matters.

pub use cancel::{CancelToken, Cancelled};
pub use channel::{ProgressChannel, ProgressObserver};
pub use snapshot::ProgressSnapshot;

mod cancel;
mod channel;
mod snapshot;
