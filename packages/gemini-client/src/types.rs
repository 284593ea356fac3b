//! Gemini `generateContent` request and response types.

use serde::{Deserialize, Serialize};

// =============================================================================
// Request
// =============================================================================

/// A `generateContent` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Conversation turns
    pub contents: Vec<Content>,

    /// System instruction, kept separate from the turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    /// Sampling and output configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateRequest {
    /// Single user turn with an optional system instruction.
    pub fn new(system: Option<String>, user: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(user)],
            system_instruction: system.map(Content::system),
            generation_config: None,
        }
    }

    /// Constrain output to JSON matching `schema` (Gemini schema dialect).
    pub fn json_schema(mut self, schema: serde_json::Value) -> Self {
        let config = self.generation_config.get_or_insert_with(Default::default);
        config.response_mime_type = Some("application/json".to_string());
        config.response_schema = Some(schema);
        self
    }

    /// Cap the model's internal reasoning tokens.
    pub fn thinking_budget(mut self, tokens: u32) -> Self {
        let config = self.generation_config.get_or_insert_with(Default::default);
        config.thinking_config = Some(ThinkingConfig {
            thinking_budget: tokens,
        });
        self
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        let config = self.generation_config.get_or_insert_with(Default::default);
        config.temperature = Some(temperature);
        self
    }
}

/// One turn of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// A system instruction (no role).
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

/// A content part. Only text parts are used here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Set on thought summaries when thinking is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

// =============================================================================
// Response
// =============================================================================

/// Raw `generateContent` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,

    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateResponse {
    /// Concatenated non-thought text of the first candidate.
    pub fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|p| !p.thought.unwrap_or(false))
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,

    #[serde(default)]
    pub candidates_token_count: u32,

    #[serde(default)]
    pub total_token_count: u32,
}
