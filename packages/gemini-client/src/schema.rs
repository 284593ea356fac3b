//! Translate `schemars` JSON schemas into Gemini's `responseSchema` dialect.
//!
//! Gemini accepts an OpenAPI 3.0 subset: upper-case `type` names, `nullable`
//! instead of `["T", "null"]`, no `$ref`, no `additionalProperties`.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const KEPT_FORMATS: &[&str] = &["int32", "int64", "float", "double", "enum", "date-time"];

/// Types that can be requested as Gemini JSON output.
pub trait ResponseSchema: JsonSchema + DeserializeOwned {
    /// Generate a Gemini `responseSchema` for this type.
    fn gemini_schema() -> Value {
        let value = serde_json::to_value(schema_for!(Self)).unwrap_or_default();
        to_gemini_schema(&value)
    }
}

impl<T: JsonSchema + DeserializeOwned> ResponseSchema for T {}

/// Convert a draft-07 JSON schema (root may carry `definitions`).
pub fn to_gemini_schema(root: &Value) -> Value {
    let definitions = root.get("definitions").cloned().unwrap_or(Value::Null);
    convert(root, &definitions)
}

fn convert(node: &Value, definitions: &Value) -> Value {
    let Value::Object(map) = node else {
        return node.clone();
    };

    if let Some(target) = map
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|p| p.strip_prefix("#/definitions/"))
        .and_then(|name| definitions.get(name))
    {
        return convert(target, definitions);
    }

    if let Some(Value::Array(variants)) = map.get("anyOf") {
        let non_null: Vec<&Value> = variants.iter().filter(|v| !is_null_type(v)).collect();
        if non_null.len() == 1 && non_null.len() < variants.len() {
            let mut inner = convert(non_null[0], definitions);
            if let Value::Object(inner_map) = &mut inner {
                inner_map.insert("nullable".to_string(), Value::Bool(true));
            }
            return inner;
        }
    }

    let mut out = Map::new();

    match map.get("type") {
        Some(Value::String(t)) => {
            out.insert("type".to_string(), Value::String(t.to_uppercase()));
        }
        Some(Value::Array(types)) => {
            let concrete: Vec<&str> = types
                .iter()
                .filter_map(Value::as_str)
                .filter(|t| *t != "null")
                .collect();
            if let Some(t) = concrete.first() {
                out.insert("type".to_string(), Value::String(t.to_uppercase()));
            }
            if concrete.len() < types.len() {
                out.insert("nullable".to_string(), Value::Bool(true));
            }
        }
        _ => {}
    }

    if let Some(format) = map.get("format").and_then(Value::as_str) {
        if KEPT_FORMATS.contains(&format) {
            out.insert("format".to_string(), Value::String(format.to_string()));
        }
    }

    for key in ["description", "enum", "required", "nullable", "minItems", "maxItems"] {
        if let Some(v) = map.get(key) {
            out.insert(key.to_string(), v.clone());
        }
    }

    if let Some(Value::Object(props)) = map.get("properties") {
        let converted: Map<String, Value> = props
            .iter()
            .map(|(k, v)| (k.clone(), convert(v, definitions)))
            .collect();
        out.insert("properties".to_string(), Value::Object(converted));
    }

    if let Some(items) = map.get("items") {
        out.insert("items".to_string(), convert(items, definitions));
    }

    if let Some(Value::Array(variants)) = map.get("anyOf") {
        let converted = variants.iter().map(|v| convert(v, definitions)).collect();
        out.insert("anyOf".to_string(), Value::Array(converted));
    }

    Value::Object(out)
}

fn is_null_type(v: &Value) -> bool {
    v.get("type").and_then(Value::as_str) == Some("null")
}
