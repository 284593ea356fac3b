//! Pure OpenAI REST API client
//!
//! A minimal client for OpenAI chat completions with function calling, used
//! to force the model to answer through a single typed function.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use openai_client::OpenAIClient;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! let client = OpenAIClient::new(api_key);
//! let person: Person = client
//!     .call_function("gpt-4.1-mini", system, user, "extract_person", "Extract a person")
//!     .await?;
//! ```

pub mod error;
pub mod schema;
pub mod tool;
pub mod types;

pub use error::{OpenAIError, Result};
pub use schema::StructuredOutput;
pub use tool::{ToolCall, ToolDefinition};
pub use types::*;

use reqwest::{header, Client};
use tracing::{debug, warn};

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Set a custom base URL (for Azure, proxies, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Function calling (tool use).
    ///
    /// Send messages with tool definitions and get tool calls or content back.
    pub async fn function_calling(&self, request: &FunctionRequest) -> Result<FunctionResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI tools API error");
            return Err(OpenAIError::from_status(status.as_u16(), &error_text));
        }

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let message = raw
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| OpenAIError::Parse("response contained no choices".into()))?;

        debug!(
            model = %request.model,
            tool_calls = message.tool_calls.len(),
            duration_ms = start.elapsed().as_millis(),
            "OpenAI function calling"
        );

        Ok(FunctionResponse {
            tool_calls: message.tool_calls.into_iter().map(ToolCall::from).collect(),
            content: message.content,
            usage: raw.usage,
        })
    }

    /// Force the model to call one function and deserialize its arguments.
    ///
    /// The parameter schema is generated from `T` in strict mode, so the
    /// arguments are guaranteed to match `T`'s shape.
    pub async fn call_function<T: StructuredOutput>(
        &self,
        model: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        name: &str,
        description: &str,
    ) -> Result<T> {
        let tool = ToolDefinition::for_type::<T>(name, description);
        let request = FunctionRequest::forced(
            model,
            vec![Message::system(system_prompt), Message::user(user_prompt)],
            tool,
        );

        let response = self.function_calling(&request).await?;
        let call = response
            .call_named(name)
            .ok_or_else(|| OpenAIError::NoToolCall(name.to_string()))?;

        call.parse_args().map_err(|e| {
            OpenAIError::Parse(format!("Failed to deserialize `{}` arguments: {}", name, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test").with_base_url("https://custom.api.com/");

        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url(), "https://custom.api.com");
    }
}
