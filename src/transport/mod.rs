//! HTTP transport for the analysis service.
//!
//! This module sends a document as a multipart upload and reports byte-level
//! progress while the body goes out.
//!
//! # Features
//!
//! - Streamed multipart body (64 KiB chunks) with a progress event per chunk
//! - Single attempt per call; no retries, no swallowed errors
//! - Structured error types with full context
//! - Lightweight `OPTIONS` probe for health checks
//!
//! The [`Transport`] trait is the seam the rest of the crate depends on, so
//! the pipeline and prober can run against a stub in tests.
//!
//! # Example
//!
//! ```no_run
//! use paper_vis_core::config::ServiceConfig;
//! use paper_vis_core::transport::{HttpTransport, Transport, UploadFile, UploadRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::with_base_url("http://localhost:8004")?;
//! let transport = HttpTransport::new(&config)?;
//! let file = UploadFile::new("paper.pdf", "application/pdf", std::fs::read("paper.pdf")?);
//! let response = transport
//!     .send(UploadRequest {
//!         payload: &file,
//!         endpoint: config.analysis_endpoint(),
//!         progress: None,
//!     })
//!     .await?;
//! println!("status {}", response.status);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod payload;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

pub use client::{HttpTransport, UPLOAD_CHUNK_SIZE, UPLOAD_FIELD_NAME};
pub use error::TransportError;
pub use payload::{FALLBACK_MEDIA_TYPE, UploadFile, UploadRequest, guess_media_type};

/// A successful (2xx) response with its decoded JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// HTTP status code, always within `200..300`.
    pub status: u16,
    /// Decoded body.
    pub body: Value,
}

/// Sends requests to the analysis service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs the payload as a multipart body (field `file`).
    ///
    /// Forwards byte-level progress to `request.progress` when the body length
    /// is known. Never emits a guaranteed final 100%.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] for network failures, non-2xx statuses, and
    /// bodies that are not valid JSON.
    async fn send(&self, request: UploadRequest<'_>) -> Result<RawResponse, TransportError>;

    /// Asks the endpoint which methods it allows and returns the status code,
    /// whatever it is.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] only when no response arrives at all.
    async fn probe(&self, endpoint: &Url) -> Result<u16, TransportError>;

    /// POSTs a JSON body, with the same status and parsing rules as [`send`](Self::send).
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    async fn post_json(&self, endpoint: &Url, body: &Value)
    -> Result<RawResponse, TransportError>;
}
