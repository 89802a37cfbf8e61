use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use kiln_progress::ProgressSnapshot;
use once_cell::sync::Lazy;

const PB_STYLE: &str = "{spinner:.blue} {prefix:>20.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {percent:>3}% {msg}";

const SPINNER_STYLE: &str = "{spinner:.blue} {prefix:>20.cyan.bold} [{elapsed_precise}] {wide_msg}";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

const TICK_INTERVAL: Duration = Duration::from_millis(120);

/// Bar length; a fraction maps onto this many steps.
const STEPS: u64 = 1000;

static PB_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(PB_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK).progress_chars(PB_CHARS))
});

static SPINNER_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(SPINNER_STYLE)
        .ok()
        .map(|style| style.tick_chars(TICK))
});

/// Draws provisioning snapshots as one bar that is reused across tasks.
pub struct SnapshotTracker {
    pb: ProgressBar,
    label: String,
    indeterminate: bool,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        let pb = ProgressBar::new(STEPS);
        if let Some(style) = PB_TEMPLATE.as_ref() {
            pb.set_style(style.clone());
        }
        pb.enable_steady_tick(TICK_INTERVAL);
        Self {
            pb,
            label: String::new(),
            indeterminate: false,
        }
    }

    pub fn update(&mut self, snapshot: &ProgressSnapshot) {
        if snapshot.task_label != self.label {
            self.label.clone_from(&snapshot.task_label);
            self.pb.reset();
            self.pb.set_prefix(self.label.clone());
        }

        if snapshot.indeterminate != self.indeterminate {
            self.indeterminate = snapshot.indeterminate;
            let style = if self.indeterminate {
                &*SPINNER_TEMPLATE
            } else {
                &*PB_TEMPLATE
            };
            if let Some(style) = style.as_ref() {
                self.pb.set_style(style.clone());
            }
            self.pb
                .set_message(if self.indeterminate { "size unknown" } else { "" });
        }

        if !snapshot.indeterminate {
            self.pb.set_position(to_steps(snapshot.fraction));
        }
    }

    pub fn finish(self, snapshot: &ProgressSnapshot) {
        if snapshot.failed {
            let detail = snapshot.detail.clone().unwrap_or_else(|| "failed".to_string());
            self.pb.abandon_with_message(detail);
        } else if snapshot.done {
            self.pb.set_position(STEPS);
            self.pb.finish_with_message("done");
        } else {
            self.pb.abandon();
        }
    }
}

fn to_steps(fraction: f32) -> u64 {
    if fraction.is_nan() {
        return 0;
    }
    (f64::from(fraction.clamp(0.0, 1.0)) * STEPS as f64).round() as u64
}
