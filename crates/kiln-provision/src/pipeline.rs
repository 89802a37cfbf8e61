use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use kiln_archive::ExtractOptions;
use kiln_config::Settings;
use kiln_fetch::{ArchiveFetcher, HttpClient, RemoteLayout};
use kiln_platform::{InstallLayout, PlatformTag};
use kiln_progress::{CancelToken, ProgressChannel, ProgressObserver};
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::state::ProvisioningState;

pub const THREAD_NAME: &str = "kiln-provision";

#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionOptions {
    /// Accept a stale install instead of downloading.
    pub skip_download: bool,
    /// Remove the archive once it has been extracted.
    pub delete_archive: bool,
    pub extract: ExtractOptions,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            skip_download: false,
            delete_archive: true,
            extract: ExtractOptions::default(),
        }
    }
}

impl From<&Settings> for ProvisionOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            skip_download: settings.skip_download,
            delete_archive: settings.delete_archive,
            ..Self::default()
        }
    }
}

/// Checksum-gated download-and-extract run for one platform.
///
/// Runs are single-flight: while one is in progress every other call to
/// [`run`](Self::run) is rejected with [`Error::AlreadyRunning`]. State and
/// progress can be read from any thread while the worker writes them.
pub struct ProvisioningPipeline<C> {
    fetcher: ArchiveFetcher<C>,
    options: ProvisionOptions,
    progress: ProgressChannel,
    cancel: CancelToken,
    state: AtomicU8,
    history: Mutex<Vec<ProvisioningState>>,
    last_error: Mutex<Option<Arc<Error>>>,
    running: AtomicBool,
    spawned: AtomicBool,
}

/// Clears the single-flight flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(feature = "reqwest")]
impl ProvisioningPipeline<kiln_fetch::ReqwestClient> {
    /// Pipeline for `platform` talking to the configured mirror.
    pub fn from_settings(settings: &Settings, platform: PlatformTag) -> Result<Self> {
        let version = settings.engine_version()?;
        let client = kiln_fetch::ReqwestClient::build(settings.user_agent.as_deref(), None)?;
        let remote = RemoteLayout::new(
            settings.download_mirror.as_str(),
            settings.remote_prefix.as_str(),
            version,
        );
        let layout = InstallLayout::new(settings.install_root(), platform);
        Ok(Self::new(
            ArchiveFetcher::new(client, remote, layout),
            ProvisionOptions::from(settings),
        ))
    }
}

impl<C: HttpClient> ProvisioningPipeline<C> {
    pub fn new(fetcher: ArchiveFetcher<C>, options: ProvisionOptions) -> Self {
        Self {
            fetcher,
            options,
            progress: ProgressChannel::new(),
            cancel: CancelToken::new(),
            state: AtomicU8::new(ProvisioningState::NotStarted as u8),
            history: Mutex::new(vec![ProvisioningState::NotStarted]),
            last_error: Mutex::new(None),
            running: AtomicBool::new(false),
            spawned: AtomicBool::new(false),
        }
    }

    pub fn layout(&self) -> &InstallLayout {
        self.fetcher.layout()
    }

    pub fn options(&self) -> &ProvisionOptions {
        &self.options
    }

    pub fn state(&self) -> ProvisioningState {
        ProvisioningState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Every state the current (or last) run has passed through.
    pub fn history(&self) -> Vec<ProvisioningState> {
        lock(&self.history).clone()
    }

    pub fn last_error(&self) -> Option<Arc<Error>> {
        lock(&self.last_error).clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn progress(&self) -> &ProgressChannel {
        &self.progress
    }

    pub fn observer(&self) -> ProgressObserver {
        self.progress.observer()
    }

    /// Ask the running worker to stop at its next chunk boundary.
    ///
    /// The token stays set: later runs of this pipeline fail immediately.
    pub fn cancel(&self) {
        info!("provisioning cancellation requested");
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run the pipeline to completion on the calling thread.
    ///
    /// Returns the terminal state. A failed run yields
    /// `Ok(ProvisioningState::Failed)` with the cause in
    /// [`last_error`](Self::last_error). `Err` is reserved for a rejected
    /// call: one made while another run is in progress, or one made from
    /// inside a tokio runtime, where blocking is not allowed. Async hosts
    /// use [`spawn`](Self::spawn).
    pub fn run(&self) -> Result<ProvisioningState> {
        if tokio::runtime::Handle::try_current().is_ok() {
            warn!("provisioning run called from inside an async runtime, rejecting call");
            return Err(Error::InsideRuntime);
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("provisioning already running, rejecting call");
            return Err(Error::AlreadyRunning);
        }
        let _guard = RunGuard(&self.running);

        self.begin();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Runtime);
        let result = match runtime {
            Ok(runtime) => runtime.block_on(self.execute()),
            Err(err) => Err(err),
        };
        Ok(self.settle(result))
    }

    fn begin(&self) {
        self.state
            .store(ProvisioningState::NotStarted as u8, Ordering::Release);
        *lock(&self.history) = vec![ProvisioningState::NotStarted];
        *lock(&self.last_error) = None;
        self.progress.reset();
    }

    async fn execute(&self) -> Result<()> {
        let layout = self.fetcher.layout();
        let platform = layout.platform();
        self.transition(ProvisioningState::CheckingChecksum);
        platform.require_supported()?;

        let marker = layout.install_marker();
        let interrupted = marker.is_file();
        if interrupted {
            warn!(path = %marker.display(), "previous provisioning run did not finish");
        }

        let matched = self
            .fetcher
            .fetch_checksum(&self.progress, &self.cancel)
            .await?;
        let install_dir = layout.install_dir();
        let install_dir_missing = !install_dir.is_dir();
        let needs_download = !matched || install_dir_missing || interrupted;
        info!(
            platform = %platform,
            matched,
            install_dir_missing,
            interrupted,
            "checksum checked"
        );

        if needs_download && self.options.skip_download {
            warn!(platform = %platform, "install is stale but downloads are disabled");
            // Keep the next run without `skip_download` from trusting it.
            kiln_fs::remove_file_if_exists(&layout.checksum())?;
        } else if needs_download {
            kiln_fs::atomic_write(&marker, platform.name().as_bytes())?;

            self.transition(ProvisioningState::Downloading);
            let archive = self.fetcher.fetch_archive(&self.progress, &self.cancel).await?;

            self.transition(ProvisioningState::Extracting);
            if kiln_fs::remove_dir_if_exists(&install_dir)? {
                info!(path = %install_dir.display(), "removed previous install");
            }
            let options = self.options.extract.clone().delete_source(self.options.delete_archive);
            kiln_archive::extract(&archive, layout.root(), &options, &self.progress, &self.cancel)?;

            self.cancel.check()?;
            kiln_fs::remove_file_if_exists(&marker)?;
        }

        self.cancel.check()?;
        Ok(())
    }

    fn settle(&self, result: Result<()>) -> ProvisioningState {
        match result {
            Ok(()) => {
                self.transition(ProvisioningState::Ready);
                self.progress.finish();
                info!(platform = %self.layout().platform(), "engine ready");
                ProvisioningState::Ready
            }
            Err(err) => {
                if matches!(
                    self.state(),
                    ProvisioningState::Downloading | ProvisioningState::Extracting
                ) {
                    self.discard_partial_install();
                }
                error!(state = %self.state(), error = %err, "provisioning failed");
                let detail = err.to_string();
                *lock(&self.last_error) = Some(Arc::new(err));
                self.transition(ProvisioningState::Failed);
                self.progress.fail(detail);
                ProvisioningState::Failed
            }
        }
    }

    /// Make sure a half-finished install is never taken for a current one.
    fn discard_partial_install(&self) {
        let layout = self.layout();
        for path in [layout.checksum(), layout.archive(), layout.archive_staging()] {
            if let Err(err) = kiln_fs::remove_file_if_exists(&path) {
                warn!(path = %path.display(), error = %err, "cleanup failed");
            }
        }
    }

    fn transition(&self, next: ProvisioningState) {
        let previous = self.state();
        if !previous.can_transition_to(next) {
            warn!(from = %previous, to = %next, "unexpected provisioning transition");
        }
        self.state.store(next as u8, Ordering::Release);
        lock(&self.history).push(next);
        info!(from = %previous, state = %next, "provisioning state");
    }
}

impl<C: HttpClient + 'static> ProvisioningPipeline<C> {
    /// Start the run on the dedicated `kiln-provision` thread.
    ///
    /// Only the first call starts a worker; later calls return `None`.
    pub fn spawn(self: &Arc<Self>) -> Option<JoinHandle<Result<ProvisioningState>>> {
        if self.spawned.swap(true, Ordering::AcqRel) {
            return None;
        }
        let pipeline = Arc::clone(self);
        match thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || pipeline.run())
        {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!(error = %err, "could not start provisioning thread");
                let detail = err.to_string();
                *lock(&self.last_error) = Some(Arc::new(Error::Spawn(err)));
                self.transition(ProvisioningState::Failed);
                self.progress.fail(detail);
                None
            }
        }
    }
}
