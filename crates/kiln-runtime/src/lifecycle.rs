use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use kiln_config::Settings;
use kiln_fs::PermissionMode;
use kiln_platform::InstallLayout;
use tracing::{debug, error, info, warn};

use crate::engine::{
    BASE_SWITCHES, DEFAULT_BACKGROUND, EngineApp, EngineBackend, EngineClient, EngineSettings,
    ResourceProvider, SurfaceOf, SurfaceRequest,
};
use crate::error::{LifecycleError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    ShuttingDown = 3,
    Stopped = 4,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Initializing,
            2 => Self::Ready,
            3 => Self::ShuttingDown,
            4 => Self::Stopped,
            _ => Self::Uninitialized,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::ShuttingDown => "shutting down",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine options that do not come from the install layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub extra_switches: Vec<String>,
    pub user_agent: Option<String>,
    pub scheme: String,
    pub background_color: u32,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            extra_switches: Vec::new(),
            user_agent: None,
            scheme: kiln_config::DEFAULT_SCHEME.to_string(),
            background_color: DEFAULT_BACKGROUND,
        }
    }
}

impl From<&Settings> for RuntimeOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            extra_switches: settings.extra_switches.clone(),
            user_agent: settings.user_agent.clone(),
            scheme: settings.scheme.clone(),
            ..Self::default()
        }
    }
}

type InitListener = Box<dyn FnOnce(bool) + Send>;

#[derive(Default)]
struct InitOutcome {
    settled: Option<bool>,
    pending: Vec<InitListener>,
}

/// The one engine app and its client.
struct NativeRuntimeHandle<B: EngineBackend> {
    app: B::App,
    client: <B::App as EngineApp>::Client,
}

/// Owns the single native engine instance of a host.
///
/// `Uninitialized -> Initializing -> Ready -> ShuttingDown -> Stopped`.
/// `Stopped` is terminal; a failed initialization goes straight there.
pub struct NativeRuntimeLifecycle<B: EngineBackend> {
    backend: B,
    layout: InstallLayout,
    options: RuntimeOptions,
    resources: Arc<dyn ResourceProvider>,
    state: AtomicU8,
    handle: Mutex<Option<NativeRuntimeHandle<B>>>,
    outcome: Mutex<InitOutcome>,
    settled: Condvar,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<B: EngineBackend> NativeRuntimeLifecycle<B> {
    pub fn new(
        backend: B,
        layout: InstallLayout,
        options: RuntimeOptions,
        resources: Arc<dyn ResourceProvider>,
    ) -> Self {
        Self {
            backend,
            layout,
            options,
            resources,
            state: AtomicU8::new(LifecycleState::Uninitialized as u8),
            handle: Mutex::new(None),
            outcome: Mutex::new(InitOutcome::default()),
            settled: Condvar::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Switches passed to the engine: the fixed base set, then the
    /// configured extras.
    pub fn switches(&self) -> Vec<String> {
        BASE_SWITCHES
            .iter()
            .map(|s| s.to_string())
            .chain(self.options.extra_switches.iter().cloned())
            .collect()
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            switches: self.switches(),
            windowless_rendering: true,
            background_color: self.options.background_color,
            user_agent: self.options.user_agent.clone(),
            install_dir: self.layout.install_dir(),
        }
    }

    /// Bring the engine up. Valid only from `Uninitialized`.
    pub fn try_initialize(&self) -> Result<()> {
        if let Err(raw) = self.state.compare_exchange(
            LifecycleState::Uninitialized as u8,
            LifecycleState::Initializing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return Err(LifecycleError::Precondition {
                operation: "initialize",
                state: LifecycleState::from_u8(raw),
            });
        }
        info!(platform = %self.layout.platform(), "initializing engine");

        match self.bootstrap() {
            Ok(handle) => {
                *lock(&self.handle) = Some(handle);
                self.state
                    .store(LifecycleState::Ready as u8, Ordering::Release);
                info!("engine initialized");
                self.settle(true);
                Ok(())
            }
            Err(err) => {
                self.state
                    .store(LifecycleState::Stopped as u8, Ordering::Release);
                error!(error = %err, "could not initialize engine");
                self.settle(false);
                Err(err)
            }
        }
    }

    /// Like [`try_initialize`](Self::try_initialize), reporting only
    /// whether the engine is up afterwards.
    ///
    /// A caller that loses the race to a concurrent initialization waits
    /// for it and shares its outcome.
    pub fn initialize(&self) -> bool {
        match self.try_initialize() {
            Ok(()) => true,
            Err(LifecycleError::Precondition { state, .. }) => {
                warn!(%state, "initialize rejected, engine already started");
                match state {
                    LifecycleState::Initializing => self.wait_settled(),
                    _ => self.is_ready(),
                }
            }
            Err(_) => false,
        }
    }

    /// Queue `listener` to run once with the initialization outcome. Runs
    /// immediately when initialization has already settled.
    pub fn on_init(&self, listener: impl FnOnce(bool) + Send + 'static) {
        let mut outcome = lock(&self.outcome);
        match outcome.settled {
            Some(ready) => {
                drop(outcome);
                listener(ready);
            }
            None => outcome.pending.push(Box::new(listener)),
        }
    }

    /// Dispose the client, then the app. A no-op unless `Ready`.
    pub fn shutdown(&self) {
        if self
            .state
            .compare_exchange(
                LifecycleState::Ready as u8,
                LifecycleState::ShuttingDown as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            debug!(state = %self.state(), "shutdown ignored");
            return;
        }

        info!("shutting down engine");
        if let Some(handle) = lock(&self.handle).take() {
            handle.client.dispose();
            handle.app.dispose();
        }
        self.state
            .store(LifecycleState::Stopped as u8, Ordering::Release);
        info!("engine stopped");
    }

    pub fn create_surface(
        &self,
        url: impl Into<String>,
        transparent: bool,
        size: Option<(u32, u32)>,
    ) -> Result<SurfaceOf<B>> {
        let handle = lock(&self.handle);
        let Some(handle) = handle.as_ref().filter(|_| self.is_ready()) else {
            return Err(LifecycleError::Precondition {
                operation: "create a surface",
                state: self.state(),
            });
        };
        let request = SurfaceRequest {
            url: url.into(),
            transparent,
            size,
        };
        debug!(url = %request.url, transparent, "creating surface");
        handle
            .client
            .create_surface(&request)
            .map_err(LifecycleError::Engine)
    }

    fn bootstrap(&self) -> Result<NativeRuntimeHandle<B>> {
        self.repair_permissions()?;

        let settings = self.engine_settings();
        debug!(switches = ?settings.switches, "starting engine");
        let app = self
            .backend
            .startup(&settings)
            .map_err(LifecycleError::EngineBootstrap)?;

        let client = match app.create_client() {
            Ok(client) => client,
            Err(err) => {
                app.dispose();
                return Err(LifecycleError::EngineBootstrap(err));
            }
        };

        if let Err(err) =
            app.register_scheme_handler_factory(&self.options.scheme, Arc::clone(&self.resources))
        {
            client.dispose();
            app.dispose();
            return Err(LifecycleError::EngineBootstrap(err));
        }
        debug!(scheme = %self.options.scheme, "scheme handler registered");

        Ok(NativeRuntimeHandle { app, client })
    }

    /// Helper binaries must be runnable by the owning user.
    fn repair_permissions(&self) -> Result<()> {
        for helper in self.layout.helper_executables() {
            match PermissionMode::OwnerExecutable.apply_to_path(&helper) {
                Ok(()) => debug!(path = %helper.display(), "helper made executable"),
                Err(err) if err.is_not_found() => {
                    warn!(path = %helper.display(), "helper executable missing, skipping");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    fn settle(&self, ready: bool) {
        let pending = {
            let mut outcome = lock(&self.outcome);
            outcome.settled = Some(ready);
            std::mem::take(&mut outcome.pending)
        };
        self.settled.notify_all();
        for listener in pending {
            listener(ready);
        }
    }

    fn wait_settled(&self) -> bool {
        let outcome = lock(&self.outcome);
        let outcome = self
            .settled
            .wait_while(outcome, |o| o.settled.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        outcome.settled.unwrap_or(false)
    }
}

impl<B: EngineBackend> Drop for NativeRuntimeLifecycle<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
