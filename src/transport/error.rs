//! Error types for the transport module.
//!
//! These are the only errors in the crate that propagate: the analysis
//! pipeline folds them into its envelope and the health prober folds them
//! into `false`.

use thiserror::Error;

/// Errors that can occur while talking to the analysis service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established or was interrupted
    /// (DNS resolution, connection refused, reset, aborted).
    #[error("network error sending to {url}: {message}")]
    Network {
        /// The endpoint that failed.
        url: String,
        /// Full text of the underlying error chain.
        message: String,
    },

    /// The client-side deadline expired before a response arrived.
    #[error("timeout waiting for {url}")]
    Timeout {
        /// The endpoint that timed out.
        url: String,
    },

    /// The server answered with a status outside `200..300`.
    #[error("HTTP {status} {reason} from {url}")]
    HttpStatus {
        /// The endpoint that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Canonical reason phrase, empty when unknown.
        reason: String,
    },

    /// The response body is not valid JSON.
    #[error("invalid JSON response from {url}: {message}")]
    MalformedResponse {
        /// The endpoint that sent the body.
        url: String,
        /// Decoder error text.
        message: String,
    },

    /// The multipart body could not be assembled (e.g. unparsable media type).
    #[error("invalid upload payload: {message}")]
    InvalidPayload {
        /// What was wrong with the payload.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    ClientBuild {
        /// Builder error text.
        message: String,
    },
}

impl TransportError {
    /// Creates a network error from a reqwest error, keeping the whole source chain.
    pub fn network(url: impl Into<String>, source: &reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            message: error_chain_text(source),
        }
    }

    /// Classifies a reqwest send/read failure into `Timeout` or `Network`.
    pub fn from_reqwest(url: impl Into<String>, source: &reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::network(url, source)
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}

/// Joins an error and all of its sources into one line.
fn error_chain_text(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
