//! Error types for Gemini client.

use thiserror::Error;

/// Result type for Gemini client operations.
pub type Result<T> = std::result::Result<T, GeminiError>;

/// Gemini client errors.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Authentication rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// API error (non-2xx response, quota, invalid request)
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The prompt or response was blocked by safety filters
    #[error("response blocked: {0}")]
    Blocked(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GeminiError {
    /// Build an error from a non-success HTTP status and its body.
    ///
    /// Gemini wraps failures as `{"error": {"code", "message", "status"}}`.
    /// An invalid key comes back as HTTP 400 with reason `API_KEY_INVALID`.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());
        let invalid_key = body.contains("API_KEY_INVALID");

        match status {
            401 | 403 => GeminiError::Auth(message),
            400 if invalid_key => GeminiError::Auth(message),
            _ => GeminiError::Api { status, message },
        }
    }
}
