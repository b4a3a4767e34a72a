//! The older two-step workflow: upload to `/upload`, then trigger `/analyze`.
//!
//! Kept as a compatibility path. New callers should use
//! [`AnalysisPipeline`](crate::analysis::AnalysisPipeline), which uploads and
//! analyzes in one request. Unlike the pipeline, these calls return the raw
//! JSON body and propagate transport errors unchanged.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, instrument};
use url::Url;

use crate::config::ServiceConfig;
use crate::progress::ProgressSink;
use crate::transport::{Transport, TransportError, UploadFile, UploadRequest};

/// Client for the `/upload` + `/analyze` endpoints.
#[derive(Clone)]
pub struct LegacyClient {
    transport: Arc<dyn Transport>,
    upload_endpoint: Url,
    analyze_endpoint: Url,
}

impl LegacyClient {
    /// Client for the configured legacy endpoints.
    #[must_use]
    pub fn new(config: &ServiceConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            upload_endpoint: config.legacy_upload_endpoint().clone(),
            analyze_endpoint: config.legacy_analyze_endpoint().clone(),
        }
    }

    /// Uploads `file` as a multipart body and returns the service's JSON.
    ///
    /// Byte-level progress is forwarded to `progress`. No media type check is
    /// made; the legacy endpoint accepts any document.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] of the failed request.
    #[instrument(skip(self, file, progress), fields(file = %file.name()))]
    pub async fn upload(
        &self,
        file: &UploadFile,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Value, TransportError> {
        let response = self
            .transport
            .send(UploadRequest {
                payload: file,
                endpoint: &self.upload_endpoint,
                progress,
            })
            .await?;
        info!(status = response.status, "legacy upload accepted");
        Ok(response.body)
    }

    /// Starts analysis of a previously uploaded folder.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] of the failed request.
    #[instrument(skip(self))]
    pub async fn start_analysis(&self, folder_id: &str) -> Result<Value, TransportError> {
        let body = json!({ "folder_id": folder_id });
        let response = self
            .transport
            .post_json(&self.analyze_endpoint, &body)
            .await?;
        info!(status = response.status, "legacy analysis started");
        Ok(response.body)
    }
}
