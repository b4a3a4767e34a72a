//! The uniform result record returned by every analysis run.

use serde::Serialize;
use serde_json::Value;

use super::error::AnalysisError;

/// Title used when the service does not report one.
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// Summary of a successful analysis, extracted defensively from the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// Paper title.
    pub title: String,
    /// Authors in the order the service listed them.
    pub authors: Vec<String>,
    /// Processing time reported by the service, or the measured duration.
    pub total_time: f64,
    /// Number of lanes in the response.
    pub lanes_count: usize,
    /// Total number of figures across all figure groups.
    pub figures_count: usize,
}

impl AnalysisMetadata {
    /// Extracts metadata from a successful response body.
    ///
    /// Missing or mistyped fields fall back to defaults: placeholder title,
    /// no authors, the measured duration, and zero counts.
    #[must_use]
    pub fn from_body(body: &Value, measured_secs: f64) -> Self {
        let title = body
            .pointer("/metadata/title")
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
            .unwrap_or(UNKNOWN_TITLE)
            .to_string();

        let authors = body
            .pointer("/metadata/authors")
            .and_then(Value::as_array)
            .map(|authors| {
                authors
                    .iter()
                    .map(|author| {
                        author
                            .as_str()
                            .map_or_else(|| author.to_string(), str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let total_time = body
            .get("total_time")
            .and_then(Value::as_f64)
            .filter(|secs| secs.abs() > f64::EPSILON)
            .unwrap_or(measured_secs);

        let lanes_count = body.get("lanes").map_or(0, entry_count);

        let figures_count = match body.get("figure_map") {
            Some(Value::Object(groups)) => groups.values().map(entry_count).sum(),
            Some(Value::Array(groups)) => groups.iter().map(entry_count).sum(),
            _ => 0,
        };

        Self {
            title,
            authors,
            total_time,
            lanes_count,
            figures_count,
        }
    }
}

/// Number of entries in a JSON collection; zero for scalars and null.
fn entry_count(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(entries) => entries.len(),
        _ => 0,
    }
}

/// Outcome of one analysis run.
///
/// Exactly one of `data` and `error` is set, matching `success`. The typed
/// failure is available through [`failure`](Self::failure) but is not
/// serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    success: bool,
    data: Option<Value>,
    error: Option<String>,
    duration: f64,
    metadata: Option<AnalysisMetadata>,
    #[serde(skip)]
    failure: Option<AnalysisError>,
}

impl ResultEnvelope {
    /// A successful run.
    #[must_use]
    pub fn succeeded(data: Value, duration_secs: f64, metadata: AnalysisMetadata) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            duration: duration_secs.max(0.0),
            metadata: Some(metadata),
            failure: None,
        }
    }

    /// A failed run.
    #[must_use]
    pub fn failed(failure: AnalysisError, duration_secs: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(failure.to_string()),
            duration: duration_secs.max(0.0),
            metadata: None,
            failure: Some(failure),
        }
    }

    /// Whether the analysis succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The full response body on success.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// The user-facing failure message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Seconds between handing the upload to the transport and its outcome.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Extracted summary on success.
    #[must_use]
    pub fn metadata(&self) -> Option<&AnalysisMetadata> {
        self.metadata.as_ref()
    }

    /// The typed failure.
    #[must_use]
    pub fn failure(&self) -> Option<&AnalysisError> {
        self.failure.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_metadata_full_body() {
        let body = json!({
            "success": true,
            "metadata": {"title": "T", "authors": ["A", "B"]},
            "total_time": 12.3,
            "lanes": {"l1": 1, "l2": 2},
            "figure_map": {"g1": [1, 2], "g2": [3]}
        });
        let metadata = AnalysisMetadata::from_body(&body, 1.0);

        assert_eq!(metadata.title, "T");
        assert_eq!(metadata.authors, vec!["A", "B"]);
        assert!((metadata.total_time - 12.3).abs() < f64::EPSILON);
        assert_eq!(metadata.lanes_count, 2);
        assert_eq!(metadata.figures_count, 3);
    }

    #[test]
    fn test_metadata_defaults_for_missing_fields() {
        let metadata = AnalysisMetadata::from_body(&json!({"success": true}), 4.5);

        assert_eq!(metadata.title, UNKNOWN_TITLE);
        assert!(metadata.authors.is_empty());
        assert!((metadata.total_time - 4.5).abs() < f64::EPSILON);
        assert_eq!(metadata.lanes_count, 0);
        assert_eq!(metadata.figures_count, 0);
    }

    #[test]
    fn test_metadata_tolerates_mistyped_fields() {
        let body = json!({
            "success": true,
            "metadata": {"title": "", "authors": "A. Author"},
            "total_time": 0,
            "lanes": null,
            "figure_map": {"g1": [1], "g2": "not a list", "g3": {"a": 1, "b": 2}}
        });
        let metadata = AnalysisMetadata::from_body(&body, 2.0);

        assert_eq!(metadata.title, UNKNOWN_TITLE);
        assert!(metadata.authors.is_empty());
        assert!((metadata.total_time - 2.0).abs() < f64::EPSILON);
        assert_eq!(metadata.lanes_count, 0);
        assert_eq!(metadata.figures_count, 3);
    }

    #[test]
    fn test_metadata_non_string_authors_kept_in_order() {
        let body = json!({"metadata": {"authors": ["A", 7, "C"]}});
        let metadata = AnalysisMetadata::from_body(&body, 0.0);
        assert_eq!(metadata.authors, vec!["A", "7", "C"]);
    }

    #[test]
    fn test_success_envelope_serializes_with_camel_case_metadata() {
        let metadata = AnalysisMetadata::from_body(&json!({"lanes": [1]}), 1.5);
        let envelope = ResultEnvelope::succeeded(json!({"success": true}), 1.5, metadata);
        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["success"], json!(true));
        assert_eq!(value["error"], Value::Null);
        assert_eq!(value["metadata"]["lanesCount"], json!(1));
        assert_eq!(value["metadata"]["figuresCount"], json!(0));
        assert_eq!(value["metadata"]["totalTime"], json!(1.5));
        assert!(value.get("failure").is_none());
    }

    #[test]
    fn test_failed_envelope_has_error_and_no_data() {
        let envelope = ResultEnvelope::failed(AnalysisError::validation("Please select a PDF file"), 0.0);

        assert!(!envelope.is_success());
        assert!(envelope.data().is_none());
        assert!(envelope.metadata().is_none());
        assert_eq!(envelope.error(), Some("Please select a PDF file"));

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["data"], Value::Null);
        assert_eq!(value["metadata"], Value::Null);
        assert_eq!(value["error"], json!("Please select a PDF file"));
    }

    #[test]
    fn test_negative_duration_clamped() {
        let envelope = ResultEnvelope::failed(AnalysisError::application("x"), -1.0);
        assert!(envelope.duration() >= 0.0);
    }
}
