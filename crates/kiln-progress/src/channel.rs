use std::sync::Arc;

use tokio::sync::watch;

use crate::snapshot::ProgressSnapshot;

/// Single-producer, multi-consumer progress cell.
///
/// The background worker writes through a `ProgressChannel`; any number of
/// [`ProgressObserver`]s read the latest snapshot without blocking. Within a
/// task, `fraction` never decreases. A terminal snapshot stays in place
/// until [`ProgressChannel::reset`].
#[derive(Clone, Debug)]
pub struct ProgressChannel {
    tx: Arc<watch::Sender<ProgressSnapshot>>,
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressChannel {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot::idle());
        Self { tx: Arc::new(tx) }
    }

    pub fn observer(&self) -> ProgressObserver {
        ProgressObserver {
            rx: self.tx.subscribe(),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tx.borrow().clone()
    }

    /// Start a fresh run.
    pub fn reset(&self) {
        self.tx.send_replace(ProgressSnapshot::idle());
    }

    /// Switch to a new task label; the fraction restarts at zero.
    pub fn begin_task(&self, label: impl Into<String>) {
        let label = label.into();
        tracing::debug!(task = %label, "progress task started");
        self.tx.send_if_modified(|s| {
            if s.is_terminal() {
                return false;
            }
            s.task_label = label;
            s.fraction = 0.0;
            s.indeterminate = false;
            true
        });
    }

    /// Publish a completion fraction for the current task.
    ///
    /// Values are clamped to `[0, 1]`; a value lower than the last published
    /// one is ignored. Non-finite values are ignored.
    pub fn set_fraction(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        self.tx.send_if_modified(|s| {
            if s.is_terminal() {
                return false;
            }
            let was_indeterminate = s.indeterminate;
            s.indeterminate = false;
            if fraction > s.fraction {
                s.fraction = fraction;
                return true;
            }
            was_indeterminate
        });
    }

    /// The current task has no known total.
    pub fn set_indeterminate(&self) {
        self.tx.send_if_modified(|s| {
            if s.is_terminal() || s.indeterminate {
                return false;
            }
            s.indeterminate = true;
            true
        });
    }

    /// Finish the run successfully. The fraction is forced to exactly 1.0.
    pub fn finish(&self) {
        self.tx.send_modify(|s| {
            s.fraction = 1.0;
            s.indeterminate = false;
            s.done = true;
            s.failed = false;
            s.detail = None;
        });
    }

    /// Finish the run with an error. The current label and fraction are kept
    /// so the host can show where it stopped.
    pub fn fail(&self, detail: impl Into<String>) {
        let detail = detail.into();
        self.tx.send_modify(|s| {
            s.done = false;
            s.failed = true;
            s.detail = Some(detail);
        });
    }
}

/// Read side of a [`ProgressChannel`].
#[derive(Clone, Debug)]
pub struct ProgressObserver {
    rx: watch::Receiver<ProgressSnapshot>,
}

impl ProgressObserver {
    /// Non-blocking read of the latest snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.rx.borrow().clone()
    }

    pub fn is_terminal(&self) -> bool {
        self.rx.borrow().is_terminal()
    }

    /// Returns the latest snapshot only if it changed since the last call.
    /// Meant for per-tick UI polling.
    pub fn poll_changed(&mut self) -> Option<ProgressSnapshot> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            _ => None,
        }
    }

    /// Wait until the run reaches a terminal snapshot.
    ///
    /// If the channel is dropped first, the last snapshot is returned as is.
    pub async fn wait_terminal(&mut self) -> ProgressSnapshot {
        let waited = self
            .rx
            .wait_for(ProgressSnapshot::is_terminal)
            .await
            .map(|snapshot| snapshot.clone());
        match waited {
            Ok(snapshot) => snapshot,
            Err(_) => self.rx.borrow().clone(),
        }
    }
}
