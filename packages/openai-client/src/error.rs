//! Error types for OpenAI client.

use thiserror::Error;

/// Result type for OpenAI client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// OpenAI client errors.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Authentication rejected (HTTP 401/403)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// API error (non-2xx response, rate limit, invalid request)
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The model answered without calling the requested function
    #[error("model did not call function `{0}`")]
    NoToolCall(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl OpenAIError {
    /// Build an error from a non-success HTTP status and its body.
    ///
    /// OpenAI wraps failures as `{"error": {"message": "..."}}`; the inner
    /// message is used when present, the raw body otherwise.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());

        match status {
            401 | 403 => OpenAIError::Auth(message),
            _ => OpenAIError::Api { status, message },
        }
    }
}
