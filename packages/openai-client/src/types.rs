//! OpenAI API request and response types.

use serde::{Deserialize, Serialize};

use crate::tool::{ToolCall, ToolDefinition};

// =============================================================================
// Messages
// =============================================================================

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user", "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// =============================================================================
// Function Calling
// =============================================================================

/// How the model may use the supplied tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolChoice {
    /// `"auto"`, `"none"` or `"required"`
    Mode(String),

    /// Force one named function
    Function {
        #[serde(rename = "type")]
        kind: String,
        function: FunctionName,
    },
}

impl ToolChoice {
    /// Let the model decide whether to call a tool.
    pub fn auto() -> Self {
        ToolChoice::Mode("auto".to_string())
    }

    /// Require the model to call the named function.
    pub fn function(name: impl Into<String>) -> Self {
        ToolChoice::Function {
            kind: "function".to_string(),
            function: FunctionName { name: name.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionName {
    pub name: String,
}

/// Function calling request.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionRequest {
    /// Model to use
    pub model: String,

    /// Conversation messages
    pub messages: Vec<Message>,

    /// Tool definitions
    pub tools: Vec<ToolDefinition>,

    /// Tool choice strategy
    pub tool_choice: ToolChoice,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl FunctionRequest {
    /// Create a request that forces a call to `tool`.
    pub fn forced(model: impl Into<String>, messages: Vec<Message>, tool: ToolDefinition) -> Self {
        let tool_choice = ToolChoice::function(tool.name.clone());
        Self {
            model: model.into(),
            messages,
            tools: vec![tool],
            tool_choice,
            temperature: Some(0.0),
        }
    }

    /// Override the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Function calling response.
#[derive(Debug, Clone)]
pub struct FunctionResponse {
    /// Tool calls made by the assistant, in order
    pub tool_calls: Vec<ToolCall>,

    /// Plain text content, if the model answered without tools
    pub content: Option<String>,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

impl FunctionResponse {
    /// Find the first call to the named function.
    pub fn call_named(&self, name: &str) -> Option<&ToolCall> {
        self.tool_calls.iter().find(|c| c.name == name)
    }
}

/// Raw chat response from API (for internal parsing).
#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseRaw {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRaw>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolCallRaw {
    pub id: String,
    pub function: FunctionCallRaw,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FunctionCallRaw {
    pub name: String,
    pub arguments: String,
}

impl From<ToolCallRaw> for ToolCall {
    fn from(raw: ToolCallRaw) -> Self {
        ToolCall {
            id: raw.id,
            name: raw.function.name,
            arguments: raw.function.arguments,
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,

    /// Total tokens used
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("You are helpful").role, "system");
        assert_eq!(Message::user("Hello").role, "user");
    }

    #[test]
    fn test_tool_choice_serialization() {
        let auto = serde_json::to_value(ToolChoice::auto()).unwrap();
        assert_eq!(auto, serde_json::json!("auto"));

        let forced = serde_json::to_value(ToolChoice::function("extract")).unwrap();
        assert_eq!(
            forced,
            serde_json::json!({"type": "function", "function": {"name": "extract"}})
        );
    }

    #[test]
    fn test_forced_request_targets_tool() {
        let tool = ToolDefinition::new("extract", "Extract data", serde_json::json!({}));
        let req = FunctionRequest::forced("gpt-4.1-mini", vec![Message::user("hi")], tool);

        assert_eq!(req.tools.len(), 1);
        assert_eq!(req.tool_choice, ToolChoice::function("extract"));
        assert_eq!(req.temperature, Some(0.0));
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let raw: ChatResponseRaw = serde_json::from_value(serde_json::json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "extract", "arguments": "{\"a\":1}"}
                    }]
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();

        let message = &raw.choices[0].message;
        assert!(message.content.is_none());
        assert_eq!(message.tool_calls[0].function.name, "extract");
        assert_eq!(raw.usage.unwrap().total_tokens, 15);
    }
}
