//! Synthetic progress for phases the transport cannot observe.
//!
//! Once the upload body is on the wire the service works silently until it
//! answers. [`SyntheticProgress`] narrates that gap: on every tick it nudges a
//! counter forward by a random step and reports it with a phase label, so a
//! UI never looks frozen. It is cosmetic only and never reaches 100; the real
//! completion event comes from the analysis pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::task::AbortHandle;
use tokio::time::{Instant, interval_at};
use tracing::debug;

use super::{ProgressEvent, ProgressSink};
use crate::config::ServiceConfig;

/// Highest value the narrator will ever report.
pub const SYNTHETIC_CEILING: f64 = 90.0;

/// Upper bound (exclusive) of the random step per tick.
pub const SYNTHETIC_MAX_STEP: f64 = 10.0;

/// Phase labels, in order of appearance.
pub const PHASE_LABELS: [&str; 5] = [
    "Uploading file...",
    "Parsing PDF...",
    "Extracting content...",
    "Analyzing semantics...",
    "Generating results...",
];

/// Starts synthetic progress tasks.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticProgress {
    tick: Duration,
}

impl Default for SyntheticProgress {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl SyntheticProgress {
    /// Narrator ticking every `tick`.
    #[must_use]
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    /// Narrator using the configured tick interval.
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.progress_tick())
    }

    /// Spawns the narrator on the current Tokio runtime.
    ///
    /// The first event arrives one tick after the call. The task ends on its
    /// own when the ceiling is reached, or when the returned handle is stopped
    /// or dropped. The sink may stop the handle from inside `report`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use = "dropping the handle stops the narrator immediately"]
    pub fn start(&self, sink: Arc<dyn ProgressSink>) -> SyntheticProgressHandle {
        let guard = Arc::new(StopGuard::default());
        let task_guard = Arc::clone(&guard);
        let tick = self.tick;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + tick, tick);
            let mut progress = 0.0_f64;

            loop {
                ticker.tick().await;

                progress += rand::thread_rng().gen_range(0.0..SYNTHETIC_MAX_STEP);
                let at_ceiling = progress >= SYNTHETIC_CEILING;
                if at_ceiling {
                    progress = SYNTHETIC_CEILING;
                }

                {
                    let _delivering = task_guard
                        .delivering
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    if task_guard.stopped.load(Ordering::SeqCst) {
                        return;
                    }
                    sink.report(narrate(progress));
                }

                if at_ceiling {
                    debug!("synthetic progress reached ceiling");
                    return;
                }
            }
        });

        SyntheticProgressHandle {
            guard,
            task: task.abort_handle(),
        }
    }
}

/// Shared between the narrator task and its handle. `delivering` is held for
/// the whole of each `report` call.
#[derive(Debug, Default)]
struct StopGuard {
    stopped: AtomicBool,
    delivering: Mutex<()>,
}

/// Handle to a running narrator.
#[derive(Debug)]
pub struct SyntheticProgressHandle {
    guard: Arc<StopGuard>,
    task: AbortHandle,
}

impl SyntheticProgressHandle {
    /// Stops the narrator. No event is delivered after this returns.
    ///
    /// Calling it again, or after the narrator finished, does nothing.
    pub fn stop(&self) {
        // Called from the sink inside `report`: the narrator task already
        // holds the delivery lock on this thread.
        let reentrant = tokio::task::try_id() == Some(self.task.id());
        let _delivering = (!reentrant).then(|| {
            self.guard
                .delivering
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
        });
        if !self.guard.stopped.swap(true, Ordering::SeqCst) {
            debug!(reentrant, "synthetic progress stopped");
        }
        self.task.abort();
    }

    /// True once the narrator task has ended (stopped or at the ceiling).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SyntheticProgressHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Maps a counter value onto its event: floor percent plus the phase label
/// at the proportional index.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn narrate(progress: f64) -> ProgressEvent {
    let clamped = progress.clamp(0.0, SYNTHETIC_CEILING);
    let index = ((clamped / 100.0) * PHASE_LABELS.len() as f64).floor() as usize;
    let label = PHASE_LABELS[index.min(PHASE_LABELS.len() - 1)];
    ProgressEvent::labeled(clamped.floor() as u8, label)
}
