//! Render progress reporting.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Receives progress from a running render. Called from worker threads.
pub trait ProgressReporter: Send + Sync {
    fn begin(&self) {}

    /// Completed share of the work, in percent.
    fn progress(&self, percent: f64);

    fn message(&self, msg: &str);

    fn end(&self, _elapsed: Duration) {}
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn progress(&self, _percent: f64) {}

    fn message(&self, _msg: &str) {}
}

/// Forwards to the `log` facade, at most once per `step` percent.
#[derive(Debug)]
pub struct LogReporter {
    step: f64,
    last: Mutex<f64>,
}

impl LogReporter {
    pub fn new(step: f64) -> Self {
        Self {
            step: step.max(0.0),
            last: Mutex::new(f64::NEG_INFINITY),
        }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl ProgressReporter for LogReporter {
    fn begin(&self) {
        log::info!("Render started");
    }

    fn progress(&self, percent: f64) {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if percent - *last >= self.step || percent >= 100.0 && *last < 100.0 {
            *last = percent;
            log::info!("Render progress: {:.1}%", percent);
        }
    }

    fn message(&self, msg: &str) {
        log::warn!("{}", msg);
    }

    fn end(&self, elapsed: Duration) {
        log::info!("Render finished in {:?}", elapsed);
    }
}

/// Terminal progress bar.
pub struct ProgressBarReporter {
    bar: ProgressBar,
}

impl ProgressBarReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}% (eta: {eta}) {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }
}

impl Default for ProgressBarReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ProgressBarReporter {
    fn progress(&self, percent: f64) {
        self.bar.set_position(percent.clamp(0.0, 100.0) as u64);
    }

    fn message(&self, msg: &str) {
        self.bar.println(msg);
    }

    fn end(&self, elapsed: Duration) {
        self.bar.finish_with_message(format!("done in {:.2?}", elapsed));
    }
}
