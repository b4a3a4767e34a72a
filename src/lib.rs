//! Paper-vis Core Library
//!
//! This library provides the client side of the paper_vis analysis service:
//! it uploads a PDF, reports upload and processing progress, and normalizes
//! the service's answer into a single [`ResultEnvelope`] that a UI can render
//! without any error handling of its own.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Service base URL and timeouts, resolved once at startup
//! - [`transport`] - Multipart upload over HTTP with byte-level progress
//! - [`progress`] - Progress events, sinks, and synthetic progress narration
//! - [`analysis`] - The analysis pipeline and its result envelope
//! - [`health`] - Lightweight availability probe for the analysis endpoint
//! - [`legacy`] - The older `/upload` + `/analyze` workflow

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod config;
pub mod health;
pub mod legacy;
pub mod progress;
pub mod transport;
mod user_agent;

// Re-export commonly used types
pub use analysis::{
    ACCEPTED_MEDIA_TYPE, AnalysisError, AnalysisMetadata, AnalysisPipeline, AnalysisRun,
    ResultEnvelope,
};
pub use config::{ConfigError, Profile, ServiceConfig};
pub use health::HealthProber;
pub use legacy::LegacyClient;
pub use progress::{
    FnSink, ProgressEvent, ProgressKind, ProgressSink, SyntheticProgress,
    SyntheticProgressHandle,
};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError, UploadFile};
