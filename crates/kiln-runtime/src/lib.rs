//! Supervision of a single native engine instance.
//!
//! [`NativeRuntimeLifecycle`] owns the engine app and client from the first
//! successful initialization until shutdown, which happens exactly once.
//! [`RuntimeContext`] bundles it with everything else a host run needs and
//! hands out a [`RuntimeGuard`] that shuts the engine down when dropped.

pub use context::{RuntimeContext, RuntimeGuard, install_signal_shutdown};
pub use cursor::{CursorFactory, CursorHandle, CursorHandleCache, CursorType};
pub use engine::{
    AUTOPLAY_SWITCH, BASE_SWITCHES, DEFAULT_BACKGROUND, DISABLE_WEB_SECURITY_SWITCH, EngineApp,
    EngineBackend, EngineClient, EngineError, EngineSettings, Resource, ResourceProvider,
    SurfaceOf, SurfaceRequest, WIDEVINE_SWITCH,
};
pub use error::{LifecycleError, Result};
pub use lifecycle::{LifecycleState, NativeRuntimeLifecycle, RuntimeOptions};

mod context;
mod cursor;
pub mod engine;
mod error;
mod lifecycle;
