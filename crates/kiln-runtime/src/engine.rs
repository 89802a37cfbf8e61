//! Seams to the native engine and to the host.
//!
//! The runtime never talks to the engine directly. A host plugs in an
//! [`EngineBackend`] (the engine binding), a [`ResourceProvider`] (serves the
//! custom scheme) and, for cursors, a [`CursorFactory`](crate::CursorFactory).

use std::path::PathBuf;
use std::sync::Arc;

pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub const AUTOPLAY_SWITCH: &str = "--autoplay-policy=no-user-gesture-required";
pub const DISABLE_WEB_SECURITY_SWITCH: &str = "--disable-web-security";
pub const WIDEVINE_SWITCH: &str = "--enable-widevine-cdm";

/// Switches every engine instance starts with, before any configured extras.
pub const BASE_SWITCHES: [&str; 3] = [AUTOPLAY_SWITCH, DISABLE_WEB_SECURITY_SWITCH, WIDEVINE_SWITCH];

/// Fully transparent white, as ARGB.
pub const DEFAULT_BACKGROUND: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub switches: Vec<String>,
    pub windowless_rendering: bool,
    /// ARGB.
    pub background_color: u32,
    pub user_agent: Option<String>,
    /// Extracted platform tree the engine loads from.
    pub install_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRequest {
    pub url: String,
    pub transparent: bool,
    /// Initial size in pixels; the engine default when `None`.
    pub size: Option<(u32, u32)>,
}

/// A resource served for the custom scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Host-side lookup for custom-scheme URLs such as `mod://assets/index.html`.
pub trait ResourceProvider: Send + Sync {
    /// `None` answers the request with "not found".
    fn resolve(&self, url: &str) -> Option<Resource>;
}

/// Binding to the native engine. `startup` is called at most once per
/// lifecycle.
pub trait EngineBackend: Send + Sync {
    type App: EngineApp;

    fn startup(&self, settings: &EngineSettings) -> Result<Self::App, EngineError>;
}

pub trait EngineApp: Send + Sync {
    type Client: EngineClient;

    fn create_client(&self) -> Result<Self::Client, EngineError>;

    fn register_scheme_handler_factory(
        &self,
        scheme: &str,
        provider: Arc<dyn ResourceProvider>,
    ) -> Result<(), EngineError>;

    fn dispose(&self);
}

pub trait EngineClient: Send + Sync {
    type Surface;

    fn create_surface(&self, request: &SurfaceRequest) -> Result<Self::Surface, EngineError>;

    fn dispose(&self);
}

/// Surface type produced by a backend's client.
pub type SurfaceOf<B> = <<<B as EngineBackend>::App as EngineApp>::Client as EngineClient>::Surface;
