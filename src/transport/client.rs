//! reqwest-backed [`Transport`] implementation.
//!
//! `HttpTransport` is built once from the [`ServiceConfig`] and reused for
//! every call, taking advantage of connection pooling.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{StreamExt, stream};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method, Response};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::TransportError;
use super::payload::{UploadFile, UploadRequest};
use super::{RawResponse, Transport};
use crate::config::ServiceConfig;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::user_agent;

/// Size of each streamed body chunk; one transfer event is reported per chunk.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Multipart field carrying the document.
pub const UPLOAD_FIELD_NAME: &str = "file";

/// HTTP transport for the analysis service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    probe_timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] if the TLS backend or system
    /// configuration prevents building a client.
    pub fn new(config: &ServiceConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|e| TransportError::ClientBuild {
                message: e.to_string(),
            })?;
        debug!(
            connect_timeout = ?config.connect_timeout(),
            request_timeout = ?config.request_timeout(),
            "HTTP transport ready"
        );
        Ok(Self {
            client,
            probe_timeout: config.probe_timeout(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(
        skip(self, request),
        fields(url = %request.endpoint, file = %request.payload.name(), bytes = request.payload.len())
    )]
    async fn send(&self, request: UploadRequest<'_>) -> Result<RawResponse, TransportError> {
        let url = request.endpoint.as_str();
        let (percent_tx, mut percent_rx) = mpsc::unbounded_channel();
        let part = streamed_part(request.payload, percent_tx)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        debug!("sending multipart upload");
        let send = self
            .client
            .post(request.endpoint.clone())
            .multipart(form)
            .send();
        tokio::pin!(send);

        // Relay chunk events from the body stream while the request is in flight.
        let result = loop {
            tokio::select! {
                biased;
                Some(percent) = percent_rx.recv() => forward(request.progress, percent),
                result = &mut send => break result,
            }
        };
        while let Ok(percent) = percent_rx.try_recv() {
            forward(request.progress, percent);
        }

        let response = result.map_err(|e| {
            warn!(error = %e, "upload failed before a response arrived");
            TransportError::from_reqwest(url, &e)
        })?;
        let raw = read_json(url, response).await?;
        info!(status = raw.status, "upload answered");
        Ok(raw)
    }

    #[instrument(skip(self), fields(url = %endpoint))]
    async fn probe(&self, endpoint: &Url) -> Result<u16, TransportError> {
        let response = self
            .client
            .request(Method::OPTIONS, endpoint.clone())
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(endpoint.as_str(), &e))?;
        let status = response.status().as_u16();
        debug!(status, "probe answered");
        Ok(status)
    }

    #[instrument(skip(self, body), fields(url = %endpoint))]
    async fn post_json(
        &self,
        endpoint: &Url,
        body: &Value,
    ) -> Result<RawResponse, TransportError> {
        let url = endpoint.as_str();
        let response = self
            .client
            .post(endpoint.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, &e))?;
        read_json(url, response).await
    }
}

fn forward(sink: Option<&dyn ProgressSink>, percent: u8) {
    if let Some(sink) = sink {
        sink.report(ProgressEvent::transfer(percent));
    }
}

/// Builds the `file` part as a chunked stream that reports its own progress.
fn streamed_part(
    payload: &UploadFile,
    percent_tx: mpsc::UnboundedSender<u8>,
) -> Result<Part, TransportError> {
    let total = payload.len() as u64;

    let mut sent: u64 = 0;
    let body_stream = stream::iter(upload_chunks(payload.shared_bytes())).map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(percent) = transfer_percent(sent, total) {
            let _ = percent_tx.send(percent);
        }
        Ok::<_, std::io::Error>(chunk)
    });

    Part::stream_with_length(Body::wrap_stream(body_stream), total)
        .file_name(payload.name().to_string())
        .mime_str(payload.media_type())
        .map_err(|e| {
            TransportError::invalid_payload(format!(
                "media type '{}': {e}",
                payload.media_type()
            ))
        })
}

/// Splits the payload into `UPLOAD_CHUNK_SIZE` views of the same buffer.
fn upload_chunks(bytes: Bytes) -> impl Iterator<Item = Bytes> + Send + Sync + 'static {
    let count = bytes.len().div_ceil(UPLOAD_CHUNK_SIZE);
    (0..count).map(move |index| {
        let start = index * UPLOAD_CHUNK_SIZE;
        let end = (start + UPLOAD_CHUNK_SIZE).min(bytes.len());
        bytes.slice(start..end)
    })
}

/// `round(sent / total * 100)`, or `None` when the total is unknown (zero).
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn transfer_percent(sent: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let ratio = sent as f64 / total as f64;
    Some((ratio * 100.0).round().clamp(0.0, 100.0) as u8)
}

/// Checks the status and decodes the body as JSON.
async fn read_json(url: &str, response: Response) -> Result<RawResponse, TransportError> {
    let status = response.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), "analysis service returned error status");
        return Err(TransportError::http_status(
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
        ));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| TransportError::from_reqwest(url, &e))?;
    let body: Value =
        serde_json::from_slice(&bytes).map_err(|e| TransportError::malformed(url, e.to_string()))?;

    Ok(RawResponse {
        status: status.as_u16(),
        body,
    })
}
