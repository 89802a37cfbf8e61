use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kiln_config::Settings;
use kiln_fetch::HttpClient;
use kiln_platform::{InstallLayout, PlatformTag};
use kiln_provision::{ProvisioningPipeline, ProvisioningState};
use tracing::info;

use crate::cursor::{CursorFactory, CursorHandle, CursorHandleCache, CursorType};
use crate::engine::{EngineBackend, ResourceProvider};
use crate::error::{LifecycleError, Result};
use crate::lifecycle::{NativeRuntimeLifecycle, RuntimeOptions};

/// Everything one host run needs: settings, layout, the engine lifecycle,
/// the cursor cache and, optionally, the pipeline that provisions the
/// engine. Contexts are independent of each other.
pub struct RuntimeContext<B: EngineBackend, F, C> {
    settings: Settings,
    layout: InstallLayout,
    lifecycle: Arc<NativeRuntimeLifecycle<B>>,
    cursors: CursorHandleCache<F>,
    provisioning: Option<Arc<ProvisioningPipeline<C>>>,
}

impl<B, F, C> RuntimeContext<B, F, C>
where
    B: EngineBackend,
    F: CursorFactory,
    C: HttpClient,
{
    pub fn new(
        settings: Settings,
        platform: PlatformTag,
        backend: B,
        resources: Arc<dyn ResourceProvider>,
        cursor_factory: F,
    ) -> Self {
        let layout = InstallLayout::new(settings.install_root(), platform);
        let lifecycle = NativeRuntimeLifecycle::new(
            backend,
            layout.clone(),
            RuntimeOptions::from(&settings),
            resources,
        );
        Self {
            settings,
            layout,
            lifecycle: Arc::new(lifecycle),
            cursors: CursorHandleCache::new(cursor_factory),
            provisioning: None,
        }
    }

    /// Gate [`start`](Self::start) on `pipeline` having reached `Ready`.
    pub fn with_provisioning(mut self, pipeline: Arc<ProvisioningPipeline<C>>) -> Self {
        self.provisioning = Some(pipeline);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn platform(&self) -> PlatformTag {
        self.layout.platform()
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn lifecycle(&self) -> &Arc<NativeRuntimeLifecycle<B>> {
        &self.lifecycle
    }

    pub fn provisioning(&self) -> Option<&Arc<ProvisioningPipeline<C>>> {
        self.provisioning.as_ref()
    }

    pub fn cursor_handle(&self, cursor: CursorType) -> CursorHandle {
        self.cursors.get(cursor)
    }

    /// Initialize the engine and return a guard that shuts it down when
    /// dropped.
    pub fn start(&self) -> Result<RuntimeGuard<B>> {
        if let Some(pipeline) = &self.provisioning {
            let state = pipeline.state();
            if state != ProvisioningState::Ready {
                return Err(LifecycleError::NotProvisioned(state));
            }
        }
        self.lifecycle.try_initialize()?;
        Ok(RuntimeGuard {
            lifecycle: Arc::clone(&self.lifecycle),
        })
    }
}

/// Shuts the engine down on drop, including while unwinding.
#[must_use = "dropping the guard shuts the engine down"]
pub struct RuntimeGuard<B: EngineBackend> {
    lifecycle: Arc<NativeRuntimeLifecycle<B>>,
}

impl<B: EngineBackend> RuntimeGuard<B> {
    pub fn lifecycle(&self) -> &Arc<NativeRuntimeLifecycle<B>> {
        &self.lifecycle
    }
}

impl<B: EngineBackend> Drop for RuntimeGuard<B> {
    fn drop(&mut self) {
        self.lifecycle.shutdown();
    }
}

/// Shut `lifecycle` down on Ctrl-C or SIGTERM.
///
/// The returned flag flips once a signal has been handled so the host can
/// leave its loop. Only one handler can be installed per process.
pub fn install_signal_shutdown<B>(lifecycle: Arc<NativeRuntimeLifecycle<B>>) -> Result<Arc<AtomicBool>>
where
    B: EngineBackend + 'static,
{
    let signalled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&signalled);
    ctrlc::set_handler(move || {
        info!("termination signal received, shutting engine down");
        lifecycle.shutdown();
        flag.store(true, Ordering::SeqCst);
    })?;
    Ok(signalled)
}
