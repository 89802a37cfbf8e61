use std::fmt;

/// One fully-formed view of the worker's progress.
///
/// Snapshots are replaced as a whole, so a reader never sees a label from
/// one update paired with a fraction from another.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Human label of the current task, e.g. "Downloading engine".
    pub task_label: String,

    /// Completion of the current task in `[0, 1]`.
    pub fraction: f32,

    /// The total size of the current task is unknown; `fraction` is not
    /// meaningful while this is set.
    pub indeterminate: bool,

    /// The run finished successfully.
    pub done: bool,

    /// The run finished with an error.
    pub failed: bool,

    /// Error message of a failed run.
    pub detail: Option<String>,
}

impl ProgressSnapshot {
    pub fn idle() -> Self {
        Self {
            task_label: String::new(),
            fraction: 0.0,
            indeterminate: false,
            done: false,
            failed: false,
            detail: None,
        }
    }

    /// The run has ended, either way. Pollers can stop polling.
    pub fn is_terminal(&self) -> bool {
        self.done || self.failed
    }

    /// Percentage in `[0, 100]`, or `None` while indeterminate.
    #[must_use]
    pub fn percentage(&self) -> Option<f32> {
        if self.indeterminate {
            None
        } else {
            Some(self.fraction * 100.0)
        }
    }
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed {
            return match &self.detail {
                Some(detail) => write!(f, "{}: failed ({detail})", self.task_label),
                None => write!(f, "{}: failed", self.task_label),
            };
        }
        match self.percentage() {
            Some(pct) => write!(f, "{} {:.0}%", self.task_label, pct),
            None => write!(f, "{} ...", self.task_label),
        }
    }
}
