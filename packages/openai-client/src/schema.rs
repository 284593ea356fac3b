//! Strict-mode schema generation for OpenAI function parameters.
//!
//! Uses `schemars` to derive a JSON schema from a Rust type, then rewrites it
//! into the subset OpenAI accepts with `strict: true`.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types that can be requested as OpenAI structured output.
///
/// Blanket-implemented for every `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate an OpenAI strict-mode schema for this type.
    ///
    /// Strict mode requires every object to set `additionalProperties: false`,
    /// every property to be listed in `required`, no `$ref`, and rejects the
    /// `format`, `title` and `default` keywords schemars emits.
    fn openai_schema() -> Value {
        let mut value = serde_json::to_value(schema_for!(Self)).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("definitions").unwrap_or(Value::Null)
            }
            _ => Value::Null,
        };

        rewrite_strict(&mut value, &definitions);
        value
    }

    /// Get the schema name for this type.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Inline `$ref`s and apply strict-mode object rules to one schema node.
fn rewrite_strict(schema: &mut Value, definitions: &Value) {
    let inlined = match schema {
        Value::Object(map) => resolve_ref(map, definitions),
        _ => return,
    };
    if let Some(inlined) = inlined {
        *schema = inlined;
        rewrite_strict(schema, definitions);
        return;
    }

    let Value::Object(map) = schema else {
        return;
    };

    map.remove("format");
    map.remove("title");
    map.remove("default");

    if map.get("type").and_then(Value::as_str) == Some("object") {
        map.insert("additionalProperties".to_string(), Value::Bool(false));
        if let Some(Value::Object(props)) = map.get("properties") {
            let required = props.keys().cloned().map(Value::String).collect();
            map.insert("required".to_string(), Value::Array(required));
        }
    }

    if let Some(Value::Object(props)) = map.get_mut("properties") {
        for (_, prop) in props.iter_mut() {
            rewrite_strict(prop, definitions);
        }
    }

    match map.get_mut("items") {
        Some(Value::Array(items)) => items
            .iter_mut()
            .for_each(|item| rewrite_strict(item, definitions)),
        Some(item) => rewrite_strict(item, definitions),
        None => {}
    }

    for key in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(variants)) = map.get_mut(key) {
            for variant in variants.iter_mut() {
                rewrite_strict(variant, definitions);
            }
        }
    }
}

fn resolve_ref(map: &Map<String, Value>, definitions: &Value) -> Option<Value> {
    let path = map.get("$ref")?.as_str()?;
    let name = path.strip_prefix("#/definitions/")?;
    definitions.get(name).cloned()
}
