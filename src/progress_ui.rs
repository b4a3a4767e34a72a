//! Progress bar rendering of pipeline and synthetic progress events.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use paper_vis_core::{ProgressEvent, ProgressKind, ProgressSink};

/// Renders progress events on stderr.
///
/// Labeled events move the bar; transfer events only update the message, so
/// a fast upload does not pin the bar at 100% while the server is still
/// working. The bar never moves backwards, and ignores events once finished.
pub(crate) struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub(crate) fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Clears the bar if no terminal event arrived.
    pub(crate) fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl ProgressSink for ProgressBarSink {
    fn report(&self, event: ProgressEvent) {
        if self.bar.is_finished() {
            return;
        }
        let label = event.label.unwrap_or_default();
        match event.kind {
            ProgressKind::Transfer => {
                self.bar.set_message(format!("Uploading... {}%", event.percent));
            }
            ProgressKind::Completed => {
                self.bar.set_position(100);
                self.bar.finish_with_message(label);
            }
            ProgressKind::Failed => self.bar.abandon_with_message(label),
            ProgressKind::Phase => {
                let percent = u64::from(event.percent);
                if percent > self.bar.position() {
                    self.bar.set_position(percent);
                }
                self.bar.set_message(label);
            }
        }
    }
}
