//! Google Gemini `generateContent` model.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http::{shared_client, status_to_error};
use super::ChatModel;
use crate::error::AideError;
use crate::types::{GenerationSettings, Message, ToolCallRequest, ToolDefinition};

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiModel {
    model: String,
    api_key: String,
    base_url: String,
    settings: GenerationSettings,
}

impl GeminiModel {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            settings: GenerationSettings::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub(crate) fn build_request_body(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> serde_json::Value {
        let mut system_parts = Vec::new();
        let mut contents: Vec<serde_json::Value> = Vec::new();

        for msg in messages {
            match msg {
                Message::System { content } => {
                    system_parts.push(serde_json::json!({"text": content}));
                }
                Message::Human { content } => {
                    contents.push(serde_json::json!({
                        "role": "user",
                        "parts": [{"text": content}],
                    }));
                }
                Message::Ai {
                    content,
                    tool_calls,
                } => {
                    let mut parts = Vec::new();
                    // Empty `parts` is rejected, so a blank reply still carries a text part.
                    if !content.is_empty() || tool_calls.is_empty() {
                        parts.push(serde_json::json!({"text": content}));
                    }
                    for call in tool_calls {
                        parts.push(serde_json::json!({
                            "functionCall": {"name": call.name, "args": call.arguments}
                        }));
                    }
                    contents.push(serde_json::json!({"role": "model", "parts": parts}));
                }
                Message::Tool {
                    tool_name, content, ..
                } => {
                    let part = serde_json::json!({
                        "functionResponse": {
                            "name": tool_name,
                            "response": function_response(content),
                        }
                    });
                    // Responses to one model turn travel together.
                    match contents.last_mut() {
                        Some(last) if last["role"] == "function" => {
                            if let Some(parts) = last["parts"].as_array_mut() {
                                parts.push(part);
                            }
                        }
                        _ => contents.push(serde_json::json!({"role": "function", "parts": [part]})),
                    }
                }
            }
        }

        let mut body = serde_json::Map::new();
        body.insert("contents".into(), serde_json::Value::Array(contents));

        if !system_parts.is_empty() {
            body.insert(
                "systemInstruction".into(),
                serde_json::json!({"parts": system_parts}),
            );
        }

        let mut gen_config = serde_json::Map::new();
        if let Some(max) = self.settings.max_tokens {
            gen_config.insert("maxOutputTokens".into(), max.into());
        }
        if let Some(temp) = self.settings.temperature {
            gen_config.insert("temperature".into(), temp.into());
        }
        if !gen_config.is_empty() {
            body.insert("generationConfig".into(), serde_json::Value::Object(gen_config));
        }

        if !tools.is_empty() {
            let declarations: Vec<serde_json::Value> = tools.iter().map(function_declaration).collect();
            body.insert(
                "tools".into(),
                serde_json::json!([{"functionDeclarations": declarations}]),
            );
        }

        serde_json::Value::Object(body)
    }
}

// Gemini requires an object response; wrap anything else.
fn function_response(content: &serde_json::Value) -> serde_json::Value {
    match content {
        serde_json::Value::Object(_) => content.clone(),
        other => serde_json::json!({"result": other}),
    }
}

// Gemini rejects object schemas with no properties, so parameterless tools
// omit `parameters` entirely.
fn function_declaration(tool: &ToolDefinition) -> serde_json::Value {
    let mut decl = serde_json::json!({
        "name": tool.name,
        "description": tool.description,
    });
    let has_properties = tool
        .parameters
        .get("properties")
        .and_then(|p| p.as_object())
        .is_some_and(|p| !p.is_empty());
    if has_properties {
        let mut parameters = tool.parameters.clone();
        let empty_required = parameters
            .get("required")
            .and_then(|r| r.as_array())
            .is_some_and(|r| r.is_empty());
        if empty_required {
            if let Some(obj) = parameters.as_object_mut() {
                obj.remove("required");
            }
        }
        decl["parameters"] = parameters;
    }
    decl
}

#[async_trait]
impl ChatModel for GeminiModel {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message, AideError> {
        let body = self.build_request_body(messages, tools);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!(model = %self.model, messages = messages.len(), tools = tools.len(), "Gemini generateContent");

        let resp = shared_client()
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: GeminiResponse = resp.json().await?;
        let candidate = data
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AideError::api(200, "No candidates in Gemini response"))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(fc) = part.function_call {
                tool_calls.push(ToolCallRequest::new(
                    uuid::Uuid::new_v4().to_string(),
                    fc.name,
                    fc.args.unwrap_or_else(|| serde_json::Value::Object(Default::default())),
                ));
            }
        }

        if text.is_empty() && tool_calls.is_empty() {
            if let Some(reason) = candidate.finish_reason.as_deref().filter(|r| *r != "STOP") {
                debug!(finish_reason = reason, "Gemini returned no content");
            }
        }

        Ok(Message::ai_with_tool_calls(text, tool_calls))
    }
}

// Internal Gemini response types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<serde_json::Value>,
}
