//! HTTP-level tests for schema-constrained generation against a mock server.

use gemini_client::{GeminiClient, GeminiError};
use schemars::JsonSchema;
use serde::Deserialize;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, JsonSchema)]
struct Person {
    name: String,
    age: i64,
}

fn text_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 9, "totalTokenCount": 21}
    })
}

#[tokio::test]
async fn test_generate_json_sends_schema_and_parses_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "g-key"))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {"type": "OBJECT"},
                "thinkingConfig": {"thinkingBudget": 300}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body(r#"{"name":"Ada","age":36}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new("g-key").with_base_url(server.uri());
    let person: Person = client
        .generate_json("gemini-2.5-flash", Some("system".into()), "user", Some(300))
        .await
        .unwrap();

    assert_eq!(person.name, "Ada");
    assert_eq!(person.age, 36);
}

#[tokio::test]
async fn test_blocked_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new("g-key").with_base_url(server.uri());
    let err = client
        .generate_json::<Person>("gemini-2.5-flash", None, "user", None)
        .await
        .unwrap_err();

    assert!(matches!(err, GeminiError::Blocked(ref r) if r == "SAFETY"));
}

#[tokio::test]
async fn test_non_json_text_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Sorry, no.")))
        .mount(&server)
        .await;

    let client = GeminiClient::new("g-key").with_base_url(server.uri());
    let err = client
        .generate_json::<Person>("gemini-2.5-flash", None, "user", None)
        .await
        .unwrap_err();

    assert!(matches!(err, GeminiError::Parse(_)));
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new("g-key").with_base_url(server.uri());
    let err = client
        .generate_json::<Person>("gemini-2.5-flash", None, "user", None)
        .await
        .unwrap_err();

    match err {
        GeminiError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "The model is overloaded.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
