//! Gemini backend: JSON mode with a response schema.

use async_trait::async_trait;
use gemini_client::{GeminiClient, GeminiError, ResponseSchema};
use serde_json::Value;
use tracing::{debug, warn};

use super::prompts::{format_user_prompt, SYSTEM_PROMPT};
use crate::config::{DEFAULT_MAX_CONTENT_CHARS, DEFAULT_THINKING_BUDGET};
use crate::credentials::BackendCredentials;
use crate::error::{ExtractionError, ExtractionResult};
use crate::traits::StructuredExtractor;
use crate::types::ExtractedOpportunity;

const BACKEND: &str = "Gemini";

/// Extracts records with `responseMimeType: application/json`.
pub struct GeminiExtractor {
    client: GeminiClient,
    model: String,
    thinking_budget: u32,
    max_content_chars: usize,
    schema: Value,
}

impl GeminiExtractor {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            thinking_budget: DEFAULT_THINKING_BUDGET,
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
            schema: response_schema(),
        }
    }

    pub fn from_credentials(creds: &BackendCredentials) -> Self {
        let mut client = GeminiClient::new(creds.api_key.expose());
        if let Some(url) = &creds.base_url {
            client = client.with_base_url(url.clone());
        }
        Self::new(client, creds.model.clone())
    }

    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = budget;
        self
    }

    pub fn with_max_content_chars(mut self, max: usize) -> Self {
        self.max_content_chars = max;
        self
    }
}

/// The record schema in Gemini's dialect, with every field required.
///
/// Fields carry serde defaults for lenient parsing, which `schemars` reads
/// as optional; the model should still fill all of them.
fn response_schema() -> Value {
    let mut schema = ExtractedOpportunity::gemini_schema();
    let keys: Vec<Value> = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().map(Value::String).collect())
        .unwrap_or_default();
    if let Value::Object(map) = &mut schema {
        map.insert("required".to_string(), Value::Array(keys));
    }
    schema
}

#[async_trait]
impl StructuredExtractor for GeminiExtractor {
    async fn extract(&self, text: &str, url: &str) -> ExtractionResult<ExtractedOpportunity> {
        let user = format_user_prompt(url, text, self.max_content_chars);
        debug!(
            url = %url,
            model = %self.model,
            thinking_budget = self.thinking_budget,
            prompt_chars = user.len(),
            "requesting Gemini extraction"
        );

        self.client
            .generate_json_with_schema::<ExtractedOpportunity>(
                &self.model,
                Some(SYSTEM_PROMPT.to_string()),
                user,
                self.schema.clone(),
                Some(self.thinking_budget),
            )
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Gemini extraction failed");
                map_error(e)
            })
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

fn map_error(e: GeminiError) -> ExtractionError {
    match e {
        GeminiError::Network(message) => ExtractionError::Network {
            backend: BACKEND,
            message,
        },
        GeminiError::Auth(message) => ExtractionError::Api {
            backend: BACKEND,
            message: format!("authentication failed: {message}"),
        },
        GeminiError::Api { status, message } => ExtractionError::Api {
            backend: BACKEND,
            message: format!("HTTP {status}: {message}"),
        },
        GeminiError::Blocked(reason) => ExtractionError::Api {
            backend: BACKEND,
            message: format!("no content returned ({reason})"),
        },
        GeminiError::Parse(message) => ExtractionError::Parse {
            backend: BACKEND,
            message,
        },
    }
}
