//! The upload-and-analyze pipeline.
//!
//! [`AnalysisPipeline::run`] validates the document, hands it to the
//! transport, and folds whatever comes back into a [`ResultEnvelope`]. It
//! never returns an error and never panics on a failed request: every
//! failure becomes a `success: false` envelope.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::envelope::{AnalysisMetadata, ResultEnvelope};
use super::error::AnalysisError;
use crate::config::ServiceConfig;
use crate::progress::{self, ProgressEvent, ProgressSink};
use crate::transport::{Transport, UploadFile, UploadRequest};

/// The only media type the service analyzes.
pub const ACCEPTED_MEDIA_TYPE: &str = "application/pdf";

/// Validation message for any other media type.
pub const INVALID_FILE_TYPE_MESSAGE: &str = "Please select a PDF file";

/// Failure message when the service reports failure without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Analysis failed";

/// Label of the event emitted right before the upload starts.
pub const PREPARING_LABEL: &str = "Preparing upload...";

/// Label of the terminal success event.
pub const COMPLETE_LABEL: &str = "Analysis complete!";

/// Prefix of the terminal failure event label.
pub const FAILED_LABEL_PREFIX: &str = "Analysis failed: ";

/// Percentage reported before the upload starts.
const PREPARING_PERCENT: u8 = 10;

/// Runs analyses against one endpoint.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct AnalysisPipeline {
    transport: Arc<dyn Transport>,
    endpoint: Url,
}

impl std::fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl AnalysisPipeline {
    /// Pipeline posting to the configured analysis endpoint.
    #[must_use]
    pub fn new(config: &ServiceConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            endpoint: config.analysis_endpoint().clone(),
        }
    }

    /// Endpoint the pipeline uploads to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Uploads `file` for analysis and returns the normalized outcome.
    ///
    /// Progress, when a sink is given: `(10, "Preparing upload...")`, then
    /// transfer events from the transport, then exactly one terminal event,
    /// `(100, "Analysis complete!")` or `(0, "Analysis failed: <message>")`.
    /// A file of the wrong media type fails without any network call.
    #[instrument(
        skip(self, file, progress),
        fields(file = %file.name(), media_type = %file.media_type(), bytes = file.len())
    )]
    pub async fn run(
        &self,
        file: &UploadFile,
        progress: Option<&dyn ProgressSink>,
    ) -> ResultEnvelope {
        if file.media_type() != ACCEPTED_MEDIA_TYPE {
            debug!("rejected before upload");
            return fail(AnalysisError::validation(INVALID_FILE_TYPE_MESSAGE), 0.0, progress);
        }

        report(progress, ProgressEvent::labeled(PREPARING_PERCENT, PREPARING_LABEL));
        let started = Instant::now();

        let sent = self
            .transport
            .send(UploadRequest {
                payload: file,
                endpoint: &self.endpoint,
                progress,
            })
            .await;
        let duration = started.elapsed().as_secs_f64();

        match sent
            .map_err(AnalysisError::from_transport)
            .and_then(|raw| normalize(raw.body, duration))
        {
            Ok((data, metadata)) => {
                info!(
                    duration_secs = duration,
                    title = %metadata.title,
                    lanes = metadata.lanes_count,
                    figures = metadata.figures_count,
                    "analysis complete"
                );
                report(progress, ProgressEvent::completed(COMPLETE_LABEL));
                ResultEnvelope::succeeded(data, duration, metadata)
            }
            Err(error) => fail(error, duration, progress),
        }
    }

    /// Spawns [`run`](Self::run) on the current runtime and returns its
    /// progress stream and eventual envelope.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn start(&self, file: UploadFile) -> AnalysisRun {
        let (tx, rx) = progress::channel();
        let pipeline = self.clone();
        let task = tokio::spawn(async move {
            let sink: &dyn ProgressSink = &tx;
            pipeline.run(&file, Some(sink)).await
        });
        AnalysisRun { progress: rx, task }
    }
}

/// A pipeline run in progress: zero or more progress events, then one envelope.
#[derive(Debug)]
pub struct AnalysisRun {
    progress: mpsc::UnboundedReceiver<ProgressEvent>,
    task: JoinHandle<ResultEnvelope>,
}

impl AnalysisRun {
    /// Next progress event; `None` once the run has finished and every event
    /// has been taken.
    pub async fn next_progress(&mut self) -> Option<ProgressEvent> {
        self.progress.recv().await
    }

    /// Waits for the envelope. Events not yet taken are discarded.
    pub async fn finish(self) -> ResultEnvelope {
        match self.task.await {
            Ok(envelope) => envelope,
            Err(join_error) => {
                warn!(error = %join_error, "analysis task ended without a result");
                ResultEnvelope::failed(
                    AnalysisError::Interrupted {
                        detail: join_error.to_string(),
                    },
                    0.0,
                )
            }
        }
    }
}

/// Checks the body's own `success` flag and extracts metadata.
fn normalize(body: Value, duration: f64) -> Result<(Value, AnalysisMetadata), AnalysisError> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or(DEFAULT_FAILURE_MESSAGE);
        return Err(AnalysisError::application(message));
    }

    let metadata = AnalysisMetadata::from_body(&body, duration);
    Ok((body, metadata))
}

fn fail(error: AnalysisError, duration: f64, progress: Option<&dyn ProgressSink>) -> ResultEnvelope {
    warn!(kind = error.kind(), error = %error, "analysis failed");
    report(
        progress,
        ProgressEvent::failed(format!("{FAILED_LABEL_PREFIX}{error}")),
    );
    ResultEnvelope::failed(error, duration)
}

fn report(progress: Option<&dyn ProgressSink>, event: ProgressEvent) {
    if let Some(sink) = progress {
        sink.report(event);
    }
}
