//! User-Agent string sent with every request to the analysis service.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/paper-vis/paper-vis";

/// Default User-Agent for analysis requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("paper-vis/{version} (analysis-client; +{PROJECT_UA_URL})")
}
