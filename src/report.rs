//! Progress and summary reporting.
//!
//! The throttler talks to an object-safe `Reporter`; the console
//! implementation drives an indicatif bar on stderr and prints the final
//! summary, and tests substitute a collecting implementation.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::pipeline::aggregate::BatchSummary;

pub trait Reporter: Send + Sync {
    fn started(&self, total: usize);
    fn progress(&self, completed: usize, total: usize);
    fn finished(&self, summary: &BatchSummary);
}

/// Progress bar plus a printed summary listing each skipped group's member
/// names and the reason it was skipped.
pub struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:32} {pos}/{len} groups {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn progress(&self, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }

    fn finished(&self, summary: &BatchSummary) {
        self.bar.finish_and_clear();
        println!(
            "Done: {} recipe(s) extracted, {} group(s) skipped.",
            summary.success_count(),
            summary.skip_count()
        );
        for skip in &summary.skipped {
            println!("  skipped [{}]: {}", skip.group, skip.reason);
        }
    }
}

/// Reporter that swallows everything; used where no console is wanted.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn started(&self, _total: usize) {}
    fn progress(&self, _completed: usize, _total: usize) {}
    fn finished(&self, _summary: &BatchSummary) {}
}
