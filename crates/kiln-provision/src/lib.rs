//! Provisioning of the native engine bundle.
//!
//! A [`ProvisioningPipeline`] checks the remote checksum against the cached
//! one and, when the install is missing or stale, downloads and unpacks the
//! archive. It normally runs on its own thread via
//! [`ProvisioningPipeline::spawn`] while the host polls a
//! [`kiln_progress::ProgressObserver`].

pub use error::{Error, Result};
pub use pipeline::{ProvisionOptions, ProvisioningPipeline, THREAD_NAME};
pub use state::ProvisioningState;

mod error;
mod pipeline;
mod state;
