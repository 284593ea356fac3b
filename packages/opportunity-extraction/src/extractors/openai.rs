//! OpenAI backend: forced function calling with a strict schema.

use async_trait::async_trait;
use openai_client::{OpenAIClient, OpenAIError};
use tracing::{debug, warn};

use super::prompts::{format_user_prompt, SYSTEM_PROMPT, TOOL_DESCRIPTION, TOOL_NAME};
use crate::config::DEFAULT_MAX_CONTENT_CHARS;
use crate::credentials::BackendCredentials;
use crate::error::{ExtractionError, ExtractionResult};
use crate::traits::StructuredExtractor;
use crate::types::ExtractedOpportunity;

const BACKEND: &str = "OpenAI";

/// Extracts records through `extract_volunteer_opportunity` function calls.
pub struct OpenAIExtractor {
    client: OpenAIClient,
    model: String,
    max_content_chars: usize,
}

impl OpenAIExtractor {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
        }
    }

    pub fn from_credentials(creds: &BackendCredentials) -> Self {
        let mut client = OpenAIClient::new(creds.api_key.expose());
        if let Some(url) = &creds.base_url {
            client = client.with_base_url(url.clone());
        }
        Self::new(client, creds.model.clone())
    }

    pub fn with_max_content_chars(mut self, max: usize) -> Self {
        self.max_content_chars = max;
        self
    }
}

#[async_trait]
impl StructuredExtractor for OpenAIExtractor {
    async fn extract(&self, text: &str, url: &str) -> ExtractionResult<ExtractedOpportunity> {
        let user = format_user_prompt(url, text, self.max_content_chars);
        debug!(url = %url, model = %self.model, prompt_chars = user.len(), "requesting OpenAI extraction");

        self.client
            .call_function::<ExtractedOpportunity>(
                &self.model,
                SYSTEM_PROMPT,
                user,
                TOOL_NAME,
                TOOL_DESCRIPTION,
            )
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "OpenAI extraction failed");
                map_error(e)
            })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

fn map_error(e: OpenAIError) -> ExtractionError {
    match e {
        OpenAIError::Network(message) => ExtractionError::Network {
            backend: BACKEND,
            message,
        },
        OpenAIError::Auth(message) => ExtractionError::Api {
            backend: BACKEND,
            message: format!("authentication failed: {message}"),
        },
        OpenAIError::Api { status, message } => ExtractionError::Api {
            backend: BACKEND,
            message: format!("HTTP {status}: {message}"),
        },
        OpenAIError::NoToolCall(name) => ExtractionError::MissingToolCall {
            backend: BACKEND,
            tool: TOOL_NAME,
            message: format!("response had no `{name}` call"),
        },
        OpenAIError::Parse(message) => ExtractionError::Parse {
            backend: BACKEND,
            message,
        },
    }
}
