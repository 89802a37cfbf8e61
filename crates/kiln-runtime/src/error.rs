use crate::engine::EngineError;
use crate::lifecycle::LifecycleState;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {operation} while the runtime is {state}")]
    Precondition {
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("engine bootstrap failed: {0}")]
    EngineBootstrap(#[source] EngineError),

    #[error("engine call failed: {0}")]
    Engine(#[source] EngineError),

    #[error(transparent)]
    Filesystem(#[from] kiln_fs::Error),

    #[error("engine is not provisioned (provisioning is {0})")]
    NotProvisioned(kiln_provision::ProvisioningState),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
