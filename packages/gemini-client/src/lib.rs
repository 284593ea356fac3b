//! Pure Gemini REST API client
//!
//! A minimal client for the Gemini `generateContent` endpoint with
//! schema-constrained JSON output.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use gemini_client::GeminiClient;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Person {
//!     name: String,
//! }
//!
//! let client = GeminiClient::new(api_key);
//! let person: Person = client
//!     .generate_json("gemini-2.5-flash", Some(system), user, None)
//!     .await?;
//! ```

pub mod error;
pub mod schema;
pub mod types;

pub use error::{GeminiError, Result};
pub use schema::{to_gemini_schema, ResponseSchema};
pub use types::*;

use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    /// Set a custom base URL (for proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call `models/{model}:generateContent`.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("x-goog-api-key", &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Gemini request failed");
                GeminiError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Gemini API error");
            return Err(GeminiError::from_status(status.as_u16(), &error_text));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        debug!(
            model = %model,
            candidates = parsed.candidates.len(),
            total_tokens = parsed.usage_metadata.as_ref().map(|u| u.total_token_count),
            duration_ms = start.elapsed().as_millis(),
            "Gemini generateContent"
        );

        Ok(parsed)
    }

    /// Generate JSON constrained to `T`'s schema and deserialize it.
    pub async fn generate_json<T: ResponseSchema>(
        &self,
        model: &str,
        system: Option<String>,
        user: impl Into<String>,
        thinking_budget: Option<u32>,
    ) -> Result<T> {
        self.generate_json_with_schema(model, system, user, T::gemini_schema(), thinking_budget)
            .await
    }

    /// Like [`generate_json`](Self::generate_json) with a caller-built
    /// `responseSchema`, for schemas that need adjusting after conversion.
    pub async fn generate_json_with_schema<T: DeserializeOwned>(
        &self,
        model: &str,
        system: Option<String>,
        user: impl Into<String>,
        schema: serde_json::Value,
        thinking_budget: Option<u32>,
    ) -> Result<T> {
        let mut request = GenerateRequest::new(system, user)
            .json_schema(schema)
            .temperature(0.0);
        if let Some(budget) = thinking_budget {
            request = request.thinking_budget(budget);
        }

        let response = self.generate_content(model, &request).await?;

        let text = match response.text() {
            Some(text) => text,
            None => {
                let reason = response
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .or_else(|| {
                        response
                            .candidates
                            .first()
                            .and_then(|c| c.finish_reason.clone())
                    })
                    .unwrap_or_else(|| "empty response".to_string());
                return Err(GeminiError::Blocked(reason));
            }
        };

        serde_json::from_str(&text)
            .map_err(|e| GeminiError::Parse(format!("Failed to deserialize response: {}", e)))
    }
}
