//! Availability probe for the analysis endpoint.

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ServiceConfig;
use crate::transport::Transport;

/// Checks whether the analysis endpoint exists without running an analysis.
#[derive(Clone)]
pub struct HealthProber {
    transport: Arc<dyn Transport>,
    endpoint: Url,
}

impl HealthProber {
    /// Prober for the configured analysis endpoint.
    #[must_use]
    pub fn new(config: &ServiceConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            endpoint: config.analysis_endpoint().clone(),
        }
    }

    /// `true` when the endpoint answers 200, or 405 (exists but does not
    /// allow the probe method). Anything else, including no answer, is `false`.
    #[instrument(skip(self), fields(url = %self.endpoint))]
    pub async fn probe(&self) -> bool {
        match self.transport.probe(&self.endpoint).await {
            Ok(status) => {
                let available = matches!(status, 200 | 405);
                debug!(status, available, "health probe answered");
                available
            }
            Err(error) => {
                warn!(error = %error, "health probe failed");
                false
            }
        }
    }
}
