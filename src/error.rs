//! Error taxonomy for catalog loading and fraud checks.
//!
//! Every variant carries owned strings so the error can be cloned into
//! `RequestState::Failed` and shown next to the record that triggered it.

use serde::Deserialize;
use thiserror::Error;

pub const NETWORK_HINT: &str =
    "Unable to connect to the fraud detection service. Please check if the server is running.";

pub const EMPTY_RESULT_HINT: &str =
    "No job data found for this job title. Try a different search term.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FraudError {
    /// The catalog source could not be read or parsed.
    #[error("Failed to load catalog: {0}")]
    Load(String),

    /// Required submission fields were blank. Never reaches the network.
    #[error("Please fill in all required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    /// Transport failure before any HTTP status was received.
    #[error("{hint} ({0})", hint = NETWORK_HINT)]
    Network(String),

    /// Non-2xx response from the scoring service.
    #[error("{message}")]
    Service { status: u16, message: String },

    /// A 2xx response whose body could not be normalized.
    #[error("Malformed response from fraud detection service: {0}")]
    MalformedResponse(String),

    /// A catalog lookup matched nothing.
    #[error("{hint}", hint = EMPTY_RESULT_HINT)]
    EmptyResult { job_title: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl FraudError {
    /// Builds a `Service` error from a non-2xx status and its raw body.
    ///
    /// A string `detail` field becomes the message; anything else falls back to
    /// `fallback`.
    pub fn from_status(status: u16, body: &str, fallback: String) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| match b.detail {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .unwrap_or(fallback);
        FraudError::Service { status, message }
    }

    pub fn network(err: &reqwest::Error) -> Self {
        FraudError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_uses_detail() {
        let err = FraudError::from_status(
            500,
            r#"{"detail": "model unavailable"}"#,
            "Server error (500)".to_string(),
        );
        assert_eq!(err.to_string(), "model unavailable");
        assert!(matches!(err, FraudError::Service { status: 500, .. }));
    }

    #[test]
    fn test_service_error_falls_back_without_body() {
        let err = FraudError::from_status(502, "<html>bad gateway</html>", "Server error (502)".to_string());
        assert_eq!(err.to_string(), "Server error (502)");
    }

    #[test]
    fn test_service_error_ignores_structured_detail() {
        // FastAPI validation errors carry a list, not a message
        let body = r#"{"detail": [{"loc": ["body", "title"], "msg": "field required"}]}"#;
        let err = FraudError::from_status(422, body, "Server error (422)".to_string());
        assert_eq!(err.to_string(), "Server error (422)");
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let err = FraudError::Validation {
            missing: vec!["title", "requirements"],
        };
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields: title, requirements"
        );
    }

    #[test]
    fn test_empty_result_message() {
        let err = FraudError::EmptyResult {
            job_title: "zzz".to_string(),
        };
        assert!(err.to_string().contains("Try a different search term"));
    }
}
