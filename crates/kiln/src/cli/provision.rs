use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use kiln_config::Settings;
use kiln_progress::{ProgressObserver, ProgressSnapshot};
use kiln_provision::{ProvisioningPipeline, ProvisioningState};
use tracing::info;

use crate::cli::{describe, load_settings};
use crate::ui::tracker::SnapshotTracker;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Args, Clone, Debug, Default)]
pub struct ProvisionArg {
    /// Engine build to install, instead of the configured one.
    #[arg(long, value_name = "VERSION")]
    pub engine_version: Option<String>,

    #[arg(long, value_name = "DIR")]
    pub install_root: Option<PathBuf>,

    /// Keep a stale install instead of downloading.
    #[arg(long)]
    pub skip_download: bool,

    /// Leave the downloaded archive next to the install.
    #[arg(long)]
    pub keep_archive: bool,

    /// Do not draw a progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

impl ProvisionArg {
    fn apply(&self, settings: &mut Settings) {
        if let Some(version) = &self.engine_version {
            settings.engine_version = Some(version.clone());
        }
        if let Some(root) = &self.install_root {
            settings.install_root = Some(root.clone());
        }
        settings.skip_download |= self.skip_download;
        if self.keep_archive {
            settings.delete_archive = false;
        }
    }
}

pub fn provision(config: Option<&Path>, arg: ProvisionArg) -> Result<ExitCode> {
    let mut settings = load_settings(config)?;
    arg.apply(&mut settings);

    let platform = kiln_platform::resolve();
    let pipeline = Arc::new(
        ProvisioningPipeline::from_settings(&settings, platform)
            .context("could not set up provisioning")?,
    );

    let on_signal = Arc::clone(&pipeline);
    ctrlc::set_handler(move || {
        info!("interrupted, cancelling provisioning");
        on_signal.cancel();
    })
    .context("could not install the Ctrl-C handler")?;

    let observer = pipeline.observer();
    let Some(worker) = pipeline.spawn() else {
        return match pipeline.last_error() {
            Some(err) => Err(anyhow!("{}", describe(&*err))),
            None => bail!("provisioning was already started"),
        };
    };

    let tracker = (!arg.no_progress).then(SnapshotTracker::new);
    let last = follow(observer, &worker, tracker);

    let state = worker
        .join()
        .map_err(|_| anyhow!("provisioning thread panicked"))??;

    if state == ProvisioningState::Ready {
        println!(
            "engine {} ready in {}",
            settings.engine_version().unwrap_or_default(),
            pipeline.layout().install_dir().display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    match pipeline.last_error() {
        Some(err) if err.is_cancelled() => eprintln!("provisioning cancelled"),
        Some(err) => eprintln!("provisioning failed: {}", describe(&*err)),
        None => eprintln!(
            "provisioning failed: {}",
            last.detail.as_deref().unwrap_or("unknown error")
        ),
    }
    Ok(ExitCode::FAILURE)
}

/// Render snapshots until the run is terminal or the worker is gone.
fn follow<T>(
    mut observer: ProgressObserver,
    worker: &JoinHandle<T>,
    mut tracker: Option<SnapshotTracker>,
) -> ProgressSnapshot {
    loop {
        if let Some(snapshot) = observer.poll_changed() {
            if let Some(tracker) = tracker.as_mut() {
                tracker.update(&snapshot);
            }
        }
        if observer.is_terminal() || worker.is_finished() {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    let last = observer.snapshot();
    if let Some(tracker) = tracker {
        tracker.finish(&last);
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings() {
        let mut settings = Settings::default();
        let arg = ProvisionArg {
            engine_version: Some("116.0.27".into()),
            install_root: Some(PathBuf::from("/opt/kiln")),
            skip_download: true,
            keep_archive: true,
            no_progress: false,
        };
        arg.apply(&mut settings);

        assert_eq!(settings.engine_version().ok(), Some("116.0.27"));
        assert_eq!(settings.install_root(), PathBuf::from("/opt/kiln"));
        assert!(settings.skip_download);
        assert!(!settings.delete_archive);
    }

    #[test]
    fn absent_flags_keep_settings() {
        let mut settings = Settings {
            engine_version: Some("1.0.0".into()),
            skip_download: true,
            ..Settings::default()
        };
        let before = settings.clone();
        ProvisionArg::default().apply(&mut settings);
        assert_eq!(settings, before);
    }
}
