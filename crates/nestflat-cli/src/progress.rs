//! Terminal progress bar fed by migration events.

use indicatif::{ProgressBar, ProgressStyle};
use nestflat_core::{MigrationEvent, MigrationObserver};
use tracing::info;

/// Roots between two progress log lines when no bar is drawn.
const LOG_INTERVAL: u64 = 100;

/// Shows how many root records the content pass has taken on.
///
/// Without a terminal the bar stays hidden and progress is logged instead.
pub struct ProgressObserver {
    bar: ProgressBar,
    total: u64,
    log_lines: bool,
}

impl ProgressObserver {
    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(bar_style());
        Self {
            bar,
            total: 0,
            log_lines: !visible,
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg:<13} [{bar:40.cyan/blue}] {pos}/{len} roots")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
}

impl MigrationObserver for ProgressObserver {
    fn on_event(&mut self, event: &MigrationEvent) {
        match *event {
            MigrationEvent::StageStarted(stage) => self.bar.set_message(stage.as_str()),
            MigrationEvent::ContentQueued { total } => {
                self.total = total as u64;
                self.bar.set_length(self.total);
                self.bar.set_position(0);
            }
            MigrationEvent::RootProcessed { remaining } => {
                let done = self.total.saturating_sub(remaining as u64);
                self.bar.set_position(done);
                if self.log_lines && logs_progress(done, remaining) {
                    info!(done, remaining, total = self.total, "content progress");
                }
            }
        }
    }
}

fn logs_progress(done: u64, remaining: usize) -> bool {
    remaining == 0 || done % LOG_INTERVAL == 0
}
