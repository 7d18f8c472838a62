//! Error types for the InferenceIQ domain.
//!
//! Each bounded context has its own `thiserror` enum.

use std::path::PathBuf;
use thiserror::Error;

/// A failure raised by a provider adapter.
///
/// The recorder captures the `Display` text of this error into the failed
/// interaction record and then hands the same value back to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Errors from reading or writing the interaction log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Log file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Malformed log line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("I/O error on {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn store_error_names_the_path() {
        let err = StoreError::NotFound {
            path: PathBuf::from("logs/genai_costs.jsonl"),
        };
        assert_eq!(
            err.to_string(),
            "Log file not found: logs/genai_costs.jsonl"
        );

        let err = StoreError::Malformed {
            line: 3,
            reason: "expected value".into(),
        };
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn serde_failures_convert_into_store_errors() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StoreError = cause.into();
        assert!(err.to_string().starts_with("Failed to serialize record"));
    }
}
