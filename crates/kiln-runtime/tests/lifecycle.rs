use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use kiln_config::Settings;
use kiln_platform::{InstallLayout, PlatformTag};
use kiln_runtime::{
    BASE_SWITCHES, CursorFactory, CursorHandle, CursorType, EngineApp, EngineBackend, EngineClient,
    EngineError, EngineSettings, LifecycleError, LifecycleState, NativeRuntimeLifecycle, Resource,
    ResourceProvider, RuntimeContext, RuntimeOptions, SurfaceRequest,
};
use tempfile::TempDir;

#[derive(Clone, Copy, PartialEq, Eq)]
enum FailAt {
    Startup,
    Client,
    Scheme,
}

#[derive(Default)]
struct Calls {
    startups: AtomicUsize,
    app_disposals: AtomicUsize,
    client_disposals: AtomicUsize,
    log: Mutex<Vec<String>>,
    settings: Mutex<Option<EngineSettings>>,
}

impl Calls {
    fn record(&self, event: impl Into<String>) {
        self.log.lock().unwrap().push(event.into());
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[derive(Clone, Default)]
struct FakeBackend {
    calls: Arc<Calls>,
    fail: Option<FailAt>,
    delay: Option<Duration>,
}

struct FakeApp {
    calls: Arc<Calls>,
    fail: Option<FailAt>,
}

struct FakeClient {
    calls: Arc<Calls>,
}

fn boom(what: &str) -> EngineError {
    format!("{what} failed").into()
}

impl EngineBackend for FakeBackend {
    type App = FakeApp;

    fn startup(&self, settings: &EngineSettings) -> Result<FakeApp, EngineError> {
        self.calls.startups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.calls.record("startup");
        *self.calls.settings.lock().unwrap() = Some(settings.clone());
        if self.fail == Some(FailAt::Startup) {
            return Err(boom("startup"));
        }
        Ok(FakeApp {
            calls: Arc::clone(&self.calls),
            fail: self.fail,
        })
    }
}

impl EngineApp for FakeApp {
    type Client = FakeClient;

    fn create_client(&self) -> Result<FakeClient, EngineError> {
        self.calls.record("create_client");
        if self.fail == Some(FailAt::Client) {
            return Err(boom("client"));
        }
        Ok(FakeClient {
            calls: Arc::clone(&self.calls),
        })
    }

    fn register_scheme_handler_factory(
        &self,
        scheme: &str,
        provider: Arc<dyn ResourceProvider>,
    ) -> Result<(), EngineError> {
        self.calls.record(format!("register:{scheme}"));
        if self.fail == Some(FailAt::Scheme) {
            return Err(boom("scheme"));
        }
        assert!(provider.resolve("mod://kiln/index.html").is_some());
        Ok(())
    }

    fn dispose(&self) {
        self.calls.app_disposals.fetch_add(1, Ordering::SeqCst);
        self.calls.record("dispose_app");
    }
}

impl EngineClient for FakeClient {
    type Surface = SurfaceRequest;

    fn create_surface(&self, request: &SurfaceRequest) -> Result<SurfaceRequest, EngineError> {
        Ok(request.clone())
    }

    fn dispose(&self) {
        self.calls.client_disposals.fetch_add(1, Ordering::SeqCst);
        self.calls.record("dispose_client");
    }
}

struct Assets;

impl ResourceProvider for Assets {
    fn resolve(&self, url: &str) -> Option<Resource> {
        url.strip_prefix("mod://kiln/").map(|path| Resource {
            mime_type: "text/html".into(),
            data: path.as_bytes().to_vec(),
        })
    }
}

struct Cursors;

impl CursorFactory for Cursors {
    fn create_cursor(&self, cursor: CursorType) -> CursorHandle {
        CursorHandle(1000 + cursor.0 as u64)
    }
}

fn linux_root() -> (TempDir, InstallLayout) {
    let dir = tempfile::Builder::new()
        .prefix("kiln-runtime-test")
        .tempdir()
        .unwrap();
    let layout = InstallLayout::new(dir.path(), PlatformTag::from_parts("linux", "x86_64"));
    (dir, layout)
}

fn lifecycle_with(backend: FakeBackend, options: RuntimeOptions) -> (TempDir, NativeRuntimeLifecycle<FakeBackend>) {
    let (dir, layout) = linux_root();
    let lifecycle = NativeRuntimeLifecycle::new(backend, layout, options, Arc::new(Assets));
    (dir, lifecycle)
}

fn lifecycle(backend: FakeBackend) -> (TempDir, NativeRuntimeLifecycle<FakeBackend>) {
    lifecycle_with(backend, RuntimeOptions::default())
}

#[test]
fn initialize_then_shutdown_disposes_client_before_app() {
    let backend = FakeBackend::default();
    let calls = Arc::clone(&backend.calls);
    let (_dir, runtime) = lifecycle(backend);
    assert_eq!(runtime.state(), LifecycleState::Uninitialized);

    runtime.try_initialize().unwrap();
    assert!(runtime.is_ready());

    runtime.shutdown();
    runtime.shutdown();

    assert_eq!(runtime.state(), LifecycleState::Stopped);
    assert_eq!(
        calls.log(),
        vec!["startup", "create_client", "register:mod", "dispose_client", "dispose_app"]
    );
    assert_eq!(calls.app_disposals.load(Ordering::SeqCst), 1);
    assert_eq!(calls.client_disposals.load(Ordering::SeqCst), 1);
}

#[test]
fn second_initialize_is_a_precondition_error() {
    let (_dir, runtime) = lifecycle(FakeBackend::default());
    runtime.try_initialize().unwrap();

    let err = runtime.try_initialize().unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Precondition {
            state: LifecycleState::Ready,
            ..
        }
    ));
    assert!(runtime.initialize(), "already ready counts as success");
}

#[test]
fn concurrent_initialize_bootstraps_once() {
    let backend = FakeBackend {
        delay: Some(Duration::from_millis(50)),
        ..FakeBackend::default()
    };
    let calls = Arc::clone(&backend.calls);
    let (_dir, runtime) = lifecycle(backend);
    let runtime = Arc::new(runtime);
    let barrier = Arc::new(Barrier::new(8));

    let results: Vec<bool> = (0..8)
        .map(|_| {
            let runtime = Arc::clone(&runtime);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                runtime.initialize()
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert!(results.iter().all(|ready| *ready));
    assert_eq!(calls.startups.load(Ordering::SeqCst), 1);
}

#[test]
fn bootstrap_failure_stops_the_runtime() {
    let backend = FakeBackend {
        fail: Some(FailAt::Startup),
        ..FakeBackend::default()
    };
    let calls = Arc::clone(&backend.calls);
    let (_dir, runtime) = lifecycle(backend);

    let err = runtime.try_initialize().unwrap_err();

    assert!(matches!(err, LifecycleError::EngineBootstrap(_)), "{err}");
    assert_eq!(runtime.state(), LifecycleState::Stopped);
    assert!(!runtime.initialize());
    runtime.shutdown();
    assert_eq!(calls.log(), vec!["startup"]);
}

#[test]
fn client_failure_disposes_the_app() {
    let backend = FakeBackend {
        fail: Some(FailAt::Client),
        ..FakeBackend::default()
    };
    let calls = Arc::clone(&backend.calls);
    let (_dir, runtime) = lifecycle(backend);

    assert!(!runtime.initialize());
    assert_eq!(calls.log(), vec!["startup", "create_client", "dispose_app"]);
}

#[test]
fn scheme_failure_disposes_everything() {
    let backend = FakeBackend {
        fail: Some(FailAt::Scheme),
        ..FakeBackend::default()
    };
    let calls = Arc::clone(&backend.calls);
    let (_dir, runtime) = lifecycle(backend);

    assert!(runtime.try_initialize().is_err());
    assert_eq!(calls.client_disposals.load(Ordering::SeqCst), 1);
    assert_eq!(calls.app_disposals.load(Ordering::SeqCst), 1);
    assert_eq!(runtime.state(), LifecycleState::Stopped);
}

#[test]
fn surfaces_need_a_ready_runtime() {
    let (_dir, runtime) = lifecycle(FakeBackend::default());
    let before = runtime.create_surface("https://example.com", false, None);
    assert!(matches!(before, Err(LifecycleError::Precondition { .. })));

    runtime.try_initialize().unwrap();
    let surface = runtime
        .create_surface("mod://kiln/index.html", true, Some((1280, 720)))
        .unwrap();
    assert_eq!(surface.url, "mod://kiln/index.html");
    assert!(surface.transparent);
    assert_eq!(surface.size, Some((1280, 720)));

    runtime.shutdown();
    let after = runtime.create_surface("https://example.com", false, None);
    assert!(matches!(
        after,
        Err(LifecycleError::Precondition {
            state: LifecycleState::Stopped,
            ..
        })
    ));
}

#[test]
fn engine_settings_carry_switches_and_options() {
    let backend = FakeBackend::default();
    let calls = Arc::clone(&backend.calls);
    let options = RuntimeOptions {
        extra_switches: vec!["--disable-gpu".into()],
        user_agent: Some("kiln-test/1.0".into()),
        scheme: "app".into(),
        ..RuntimeOptions::default()
    };
    let (_dir, runtime) = lifecycle_with(backend, options);

    runtime.try_initialize().unwrap();

    let settings = calls.settings.lock().unwrap().clone().unwrap();
    let mut expected: Vec<String> = BASE_SWITCHES.iter().map(|s| s.to_string()).collect();
    expected.push("--disable-gpu".into());
    assert_eq!(settings.switches, expected);
    assert!(settings.windowless_rendering);
    assert_eq!(settings.background_color, kiln_runtime::DEFAULT_BACKGROUND);
    assert_eq!(settings.user_agent.as_deref(), Some("kiln-test/1.0"));
    assert_eq!(settings.install_dir, runtime.layout().install_dir());
    assert!(calls.log().contains(&"register:app".to_string()));
}

#[test]
fn init_listeners_run_once_with_outcome() {
    let (_dir, runtime) = lifecycle(FakeBackend::default());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let early = Arc::clone(&seen);
    runtime.on_init(move |ready| early.lock().unwrap().push(("early", ready)));
    runtime.try_initialize().unwrap();
    let late = Arc::clone(&seen);
    runtime.on_init(move |ready| late.lock().unwrap().push(("late", ready)));

    assert_eq!(*seen.lock().unwrap(), vec![("early", true), ("late", true)]);
}

#[test]
fn failed_init_notifies_listeners() {
    let backend = FakeBackend {
        fail: Some(FailAt::Startup),
        ..FakeBackend::default()
    };
    let (_dir, runtime) = lifecycle(backend);
    let seen = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&seen);
    runtime.on_init(move |ready| *slot.lock().unwrap() = Some(ready));

    runtime.initialize();

    assert_eq!(*seen.lock().unwrap(), Some(false));
}

#[test]
fn missing_helpers_are_skipped() {
    let (_dir, runtime) = lifecycle(FakeBackend::default());
    assert!(!runtime.layout().install_dir().exists());
    assert!(runtime.initialize());
}

#[cfg(unix)]
#[test]
fn helpers_become_owner_executable() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, runtime) = lifecycle(FakeBackend::default());
    let helper = runtime.layout().install_dir().join("jcef_helper");
    std::fs::create_dir_all(helper.parent().unwrap()).unwrap();
    std::fs::write(&helper, b"#!/bin/sh\n").unwrap();
    std::fs::set_permissions(&helper, std::fs::Permissions::from_mode(0o644)).unwrap();

    runtime.try_initialize().unwrap();

    let mode = std::fs::metadata(&helper).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o700);
}

fn settings_for(root: &Path) -> Settings {
    Settings {
        install_root: Some(root.to_path_buf()),
        extra_switches: vec!["--mute-audio".into()],
        ..Settings::default()
    }
}

/// Never reached: the provisioning checks below fail before any request.
struct Offline;

impl kiln_fetch::HttpClient for Offline {
    type Error = std::io::Error;

    async fn get(&self, url: &str) -> Result<kiln_fetch::RemoteBody<std::io::Error>, std::io::Error> {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotConnected,
            format!("offline: {url}"),
        ))
    }
}

type TestContext = RuntimeContext<FakeBackend, Cursors, Offline>;

#[test]
fn guard_shuts_down_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::default();
    let calls = Arc::clone(&backend.calls);
    let context = TestContext::new(
        settings_for(dir.path()),
        PlatformTag::from_parts("linux", "amd64"),
        backend,
        Arc::new(Assets),
        Cursors,
    );

    {
        let guard = context.start().unwrap();
        assert!(guard.lifecycle().is_ready());
        assert_eq!(context.layout().root(), dir.path());
    }

    assert_eq!(context.lifecycle().state(), LifecycleState::Stopped);
    assert_eq!(calls.app_disposals.load(Ordering::SeqCst), 1);
    let settings = calls.settings.lock().unwrap().clone().unwrap();
    assert_eq!(settings.switches.last().map(String::as_str), Some("--mute-audio"));
}

#[test]
fn guard_shuts_down_while_unwinding() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::default();
    let calls = Arc::clone(&backend.calls);
    let context = TestContext::new(
        settings_for(dir.path()),
        PlatformTag::from_parts("linux", "amd64"),
        backend,
        Arc::new(Assets),
        Cursors,
    );

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = context.start().unwrap();
        panic!("host crashed");
    }));

    assert!(result.is_err());
    assert_eq!(calls.client_disposals.load(Ordering::SeqCst), 1);
    assert_eq!(calls.app_disposals.load(Ordering::SeqCst), 1);
}

#[test]
fn start_requires_a_provisioned_engine() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_for(dir.path());
    let platform = PlatformTag::from_parts("linux", "amd64");
    let layout = InstallLayout::new(settings.install_root(), platform);
    let fetcher = kiln_fetch::ArchiveFetcher::new(
        Offline,
        kiln_fetch::RemoteLayout::with_version("1"),
        layout,
    );
    let pipeline = Arc::new(kiln_provision::ProvisioningPipeline::new(
        fetcher,
        kiln_provision::ProvisionOptions::from(&settings),
    ));
    let backend = FakeBackend::default();
    let calls = Arc::clone(&backend.calls);
    let context = TestContext::new(settings, platform, backend, Arc::new(Assets), Cursors)
        .with_provisioning(Arc::clone(&pipeline));

    let err = context.start().err().unwrap();
    assert!(matches!(
        err,
        LifecycleError::NotProvisioned(kiln_provision::ProvisioningState::NotStarted)
    ));

    assert_eq!(pipeline.run().unwrap(), kiln_provision::ProvisioningState::Failed);
    assert!(matches!(
        context.start().err().unwrap(),
        LifecycleError::NotProvisioned(kiln_provision::ProvisioningState::Failed)
    ));
    assert_eq!(calls.startups.load(Ordering::SeqCst), 0);
}

#[test]
fn cursor_handles_are_cached_per_context() {
    let dir = tempfile::tempdir().unwrap();
    let context = TestContext::new(
        settings_for(dir.path()),
        PlatformTag::from_parts("linux", "amd64"),
        FakeBackend::default(),
        Arc::new(Assets),
        Cursors,
    );

    assert_eq!(context.cursor_handle(CursorType(3)), CursorHandle(1003));
    assert_eq!(context.cursor_handle(CursorType(3)), CursorHandle(1003));
}
