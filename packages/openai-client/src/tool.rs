//! Function definitions and calls for OpenAI function calling.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use openai_client::ToolDefinition;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct SearchArgs {
//!     query: String,
//! }
//!
//! let tool = ToolDefinition::for_type::<SearchArgs>("web_search", "Search the web");
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::schema::StructuredOutput;

/// A function the model may (or must) call.
///
/// Serializes to the OpenAI wire shape
/// `{"type": "function", "function": {name, description, parameters, strict}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(into = "WireTool")]
pub struct ToolDefinition {
    /// The name of the function.
    pub name: String,

    /// A description of what the function does.
    pub description: String,

    /// JSON schema for the function's parameters.
    pub parameters: serde_json::Value,

    /// Whether OpenAI should enforce the schema exactly.
    pub strict: bool,
}

impl ToolDefinition {
    /// Create a non-strict definition from a hand-written schema.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            strict: false,
        }
    }

    /// Create a strict definition whose parameters are the schema of `T`.
    pub fn for_type<T: StructuredOutput>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: T::openai_schema(),
            strict: true,
        }
    }
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
    strict: bool,
}

impl From<ToolDefinition> for WireTool {
    fn from(def: ToolDefinition) -> Self {
        WireTool {
            kind: "function",
            function: WireFunction {
                name: def.name,
                description: def.description,
                parameters: def.parameters,
                strict: def.strict,
            },
        }
    }
}

/// A tool call from the model.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// The ID of this tool call.
    pub id: String,

    /// The name of the function called.
    pub name: String,

    /// The arguments as a JSON string.
    pub arguments: String,
}

impl ToolCall {
    /// Parse arguments into a typed struct.
    pub fn parse_args<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct EchoArgs {
        message: String,
    }

    #[test]
    fn test_wire_format() {
        let def = ToolDefinition::for_type::<EchoArgs>("echo", "Echo back the input message");
        let wire = serde_json::to_value(&def).unwrap();

        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "echo");
        assert_eq!(wire["function"]["strict"], true);
        assert_eq!(wire["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_parse_args() {
        let call = ToolCall {
            id: "call_123".to_string(),
            name: "echo".to_string(),
            arguments: r#"{"message": "hello"}"#.to_string(),
        };

        let args: EchoArgs = call.parse_args().unwrap();
        assert_eq!(args.message, "hello");
    }
}
