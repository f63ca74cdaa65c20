#![cfg(feature = "gemini")]

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aide::error::AideError;
use aide::model::{ChatModel, GeminiModel};
use aide::types::{Message, ToolDefinition};

const ENDPOINT: &str = "/models/gemini-2.0-flash:generateContent";

fn model(server: &MockServer) -> GeminiModel {
    GeminiModel::new("gemini-2.0-flash", "test-key").with_base_url(server.uri())
}

#[tokio::test]
async fn text_reply_becomes_ai_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "### System Instructions:\n"}]},
            "contents": [{"role": "user", "parts": [{"text": "chào"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Xin "}, {"text": "chào!"}]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = model(&server)
        .invoke(
            &[Message::system("### System Instructions:\n"), Message::human("chào")],
            &[],
        )
        .await
        .unwrap();

    assert_eq!(reply, Message::ai("Xin chào!"));
}

#[tokio::test]
async fn function_calls_become_tool_call_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({
            "tools": [{"functionDeclarations": [{"name": "send_email"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"functionCall": {"name": "send_email", "args": {"to": "bob@example.com"}}},
                    {"functionCall": {"name": "get_docs"}}
                ]},
                "finishReason": "STOP"
            }]
        })))
        .mount(&server)
        .await;

    let tools = vec![ToolDefinition {
        name: "send_email".into(),
        description: "sending mail".into(),
        parameters: json!({
            "type": "object",
            "properties": {"to": {"type": "string"}},
            "required": ["to"]
        }),
    }];
    let reply = model(&server)
        .invoke(&[Message::human("mail bob")], &tools)
        .await
        .unwrap();

    let calls = reply.tool_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].name, "send_email");
    assert_eq!(calls[0].arguments, json!({"to": "bob@example.com"}));
    assert_eq!(calls[1].arguments, json!({}));
    assert!(!calls[0].id.is_empty());
    assert_ne!(calls[0].id, calls[1].id);
    assert_eq!(reply.text(), "");
}

#[tokio::test]
async fn rejected_key_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
        })))
        .mount(&server)
        .await;

    let err = model(&server)
        .invoke(&[Message::human("hi")], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AideError::Authentication(m) if m == "API key not valid"));
}

#[tokio::test]
async fn server_error_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&server)
        .await;

    let err = model(&server)
        .invoke(&[Message::human("hi")], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AideError::Api { status: 500, .. }));
}

#[tokio::test]
async fn missing_candidates_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let err = model(&server)
        .invoke(&[Message::human("hi")], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AideError::Api { status: 200, .. }));
}

#[tokio::test]
async fn slow_reply_is_bounded_by_the_caller_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "candidates": [{"content": {"role": "model", "parts": [{"text": "late"}]}}]
                }))
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let model = model(&server);
    let messages = [Message::human("hi")];
    let err = aide::util::run_bounded(
        std::time::Duration::from_millis(200),
        &tokio_util::sync::CancellationToken::new(),
        "model",
        model.invoke(&messages, &[]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AideError::Timeout(200)));

    let reply = aide::util::run_bounded(
        std::time::Duration::from_secs(10),
        &tokio_util::sync::CancellationToken::new(),
        "model",
        model.invoke(&messages, &[]),
    )
    .await
    .unwrap();
    assert_eq!(reply, Message::ai("late"));
}
