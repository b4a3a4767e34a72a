//! Progress reporting for analysis runs.
//!
//! Progress flows one way: producers (the transport, the pipeline, the
//! synthetic narrator) push [`ProgressEvent`]s into a caller-supplied
//! [`ProgressSink`]. Delivery is fire-and-forget; a sink never reports back
//! and a closed channel is silently ignored.
//!
//! Two sinks are provided:
//! - a Tokio unbounded channel sender, see [`channel`]
//! - [`FnSink`], wrapping a closure

mod synthetic;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

pub use synthetic::{
    PHASE_LABELS, SYNTHETIC_CEILING, SYNTHETIC_MAX_STEP, SyntheticProgress,
    SyntheticProgressHandle,
};

/// What an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    /// Bytes of the upload body handed to the connection.
    Transfer,
    /// An intermediate phase of the run.
    Phase,
    /// The run succeeded. Always the last event of a run.
    Completed,
    /// The run failed. Always the last event of a run.
    Failed,
}

/// One progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// Completion percentage, always within `0..=100`.
    pub percent: u8,
    /// Human-readable phase. Byte-level transfer events carry no label.
    pub label: Option<String>,
    /// Event kind.
    pub kind: ProgressKind,
}

impl ProgressEvent {
    /// A byte-level transfer event (no label).
    #[must_use]
    pub fn transfer(percent: u8) -> Self {
        Self {
            percent: percent.min(100),
            label: None,
            kind: ProgressKind::Transfer,
        }
    }

    /// An intermediate event with a phase label.
    #[must_use]
    pub fn labeled(percent: u8, label: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            label: Some(label.into()),
            kind: ProgressKind::Phase,
        }
    }

    /// Terminal success event at 100%.
    #[must_use]
    pub fn completed(label: impl Into<String>) -> Self {
        Self {
            percent: 100,
            label: Some(label.into()),
            kind: ProgressKind::Completed,
        }
    }

    /// Terminal failure event at 0%.
    #[must_use]
    pub fn failed(label: impl Into<String>) -> Self {
        Self {
            percent: 0,
            label: Some(label.into()),
            kind: ProgressKind::Failed,
        }
    }

    /// True for the event that ends a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, ProgressKind::Completed | ProgressKind::Failed)
    }
}

/// Receiver of progress updates.
pub trait ProgressSink: Send + Sync {
    /// Delivers one event. Must not block.
    fn report(&self, event: ProgressEvent);
}

impl ProgressSink for mpsc::UnboundedSender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        // Receiver gone means nobody is watching anymore.
        let _ = self.send(event);
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Arc<S> {
    fn report(&self, event: ProgressEvent) {
        (**self).report(event);
    }
}

/// Adapts a closure into a [`ProgressSink`].
pub struct FnSink<F>(pub F);

impl<F> ProgressSink for FnSink<F>
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        (self.0)(event);
    }
}

/// Creates a channel whose sender is a [`ProgressSink`].
#[must_use]
pub fn channel() -> (
    mpsc::UnboundedSender<ProgressEvent>,
    mpsc::UnboundedReceiver<ProgressEvent>,
) {
    mpsc::unbounded_channel()
}
