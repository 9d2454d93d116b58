//! Progress and log reporting callbacks.
//!
//! The pipeline never touches the terminal (or any UI) directly. It emits
//! events through two callback traits and the caller decides how to
//! dispatch them to its own context. Both callbacks are invoked from the
//! worker and must not block it.
//!
//! This module also provides the CLI implementations: an indicatif progress
//! bar for [`ProgressCallback`] and a `log`-facade sink for [`LogCallback`].

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// Severity of a per-file pipeline log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Routine progress information (file being processed, cache hit).
    Info,
    /// A completed positive outcome (date found, merge written).
    Success,
    /// Recoverable oddity (no date found, duplicate dropped).
    Warning,
    /// Per-file failure (unreadable PDF, OCR error).
    Error,
}

/// Progress callback for the payslip pipeline.
///
/// Called after each file with the overall completion percentage.
pub trait ProgressCallback: Send + Sync {
    /// Called after each processed file.
    ///
    /// # Arguments
    ///
    /// * `percent` - Overall completion in the range 0..=100
    fn on_progress(&self, percent: f64);
}

/// Log callback for per-file pipeline outcomes.
pub trait LogCallback: Send + Sync {
    /// Called once per notable pipeline event.
    ///
    /// # Arguments
    ///
    /// * `message` - Human-readable event description
    /// * `level` - Event severity
    fn on_log(&self, message: &str, level: LogLevel);
}

/// Progress reporter rendering an indicatif bar on the terminal.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bar is displayed.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/100 ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    /// Finish and clear the bar, if one is active.
    pub fn finish(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl ProgressCallback for Progress {
    fn on_progress(&self, percent: f64) {
        if self.quiet {
            return;
        }

        let mut guard = self.bar.lock().unwrap();
        let bar = guard.get_or_insert_with(|| {
            let bar = ProgressBar::new(100);
            bar.set_style(Self::style());
            bar.set_message("Arranging payslips");
            bar
        });
        bar.set_position(percent.clamp(0.0, 100.0).round() as u64);
    }
}

/// Log sink forwarding pipeline events to the `log` facade.
///
/// Severity mapping: Info and Success log at info, Warning at warn,
/// Error at error.
#[derive(Debug, Default)]
pub struct ConsoleLog;

impl LogCallback for ConsoleLog {
    fn on_log(&self, message: &str, level: LogLevel) {
        match level {
            LogLevel::Info => log::info!("{}", message),
            LogLevel::Success => log::info!("{}", message),
            LogLevel::Warning => log::warn!("{}", message),
            LogLevel::Error => log::error!("{}", message),
        }
    }
}
