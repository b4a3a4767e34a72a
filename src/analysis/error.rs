//! Failure kinds surfaced in a [`ResultEnvelope`](super::ResultEnvelope).
//!
//! The `Display` text of each variant is the user-facing message placed in
//! the envelope's `error` field. Diagnostic detail stays in the variant.

use thiserror::Error;

use crate::transport::TransportError;

/// Message shown when the service cannot be reached because the browser-side
/// cross-origin policy (or a proxy emulating it) blocked the request.
pub const CROSS_ORIGIN_MESSAGE: &str = "Cross-origin request blocked: check the analysis server's CORS configuration or use the development proxy";

/// Why an analysis run did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The input failed a check before any network I/O.
    #[error("{message}")]
    Validation {
        /// User-facing explanation.
        message: String,
    },

    /// The service could not be reached or the connection dropped.
    #[error("Network error: could not reach the analysis service")]
    Network {
        /// Raw transport error text, for logs only.
        detail: String,
    },

    /// The service answered with an unsuccessful HTTP status.
    #[error("Server error: {status} {reason}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Reason phrase.
        reason: String,
    },

    /// The response body was not the JSON the service promises.
    #[error("Invalid JSON response")]
    MalformedResponse {
        /// Decoder error text, for logs only.
        detail: String,
    },

    /// The service decoded the upload but reported its own failure.
    #[error("{message}")]
    Application {
        /// Service-provided message, or the default failure text.
        message: String,
    },

    /// A network failure whose text shows a cross-origin block.
    #[error("{}", CROSS_ORIGIN_MESSAGE)]
    CrossOrigin {
        /// Raw transport error text, for logs only.
        detail: String,
    },

    /// The background run ended without producing a result (panic or cancellation).
    #[error("Analysis was interrupted")]
    Interrupted {
        /// Join error text, for logs only.
        detail: String,
    },
}

impl AnalysisError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an application error.
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application {
            message: message.into(),
        }
    }

    /// Maps a transport failure onto the user-facing taxonomy.
    #[must_use]
    pub fn from_transport(error: TransportError) -> Self {
        match error {
            TransportError::Network { message, .. } => {
                if is_cross_origin(&message) {
                    Self::CrossOrigin { detail: message }
                } else {
                    Self::Network { detail: message }
                }
            }
            TransportError::Timeout { .. } | TransportError::ClientBuild { .. } => Self::Network {
                detail: error.to_string(),
            },
            TransportError::HttpStatus { status, reason, .. } => Self::HttpStatus {
                status,
                reason: if reason.is_empty() {
                    "Unknown Status".to_string()
                } else {
                    reason
                },
            },
            TransportError::MalformedResponse { message, .. } => {
                Self::MalformedResponse { detail: message }
            }
            TransportError::InvalidPayload { .. } => Self::Validation {
                message: error.to_string(),
            },
        }
    }

    /// Stable short name of the failure kind, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Network { .. } => "network",
            Self::HttpStatus { .. } => "http_status",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Application { .. } => "application",
            Self::CrossOrigin { .. } => "cross_origin",
            Self::Interrupted { .. } => "interrupted",
        }
    }
}

/// True when raw error text points at a cross-origin block.
#[must_use]
pub fn is_cross_origin(text: &str) -> bool {
    text.contains("CORS")
        || text.contains("Failed to fetch")
        || text.to_ascii_lowercase().contains("cross-origin")
}
