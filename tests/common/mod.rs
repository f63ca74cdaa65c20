//! Shared test helpers: a scripted chat model and a scripted tool transport.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use aide::error::AideError;
use aide::mcp::{ToolCallOutput, ToolSchema, ToolTransport};
use aide::model::ChatModel;
use aide::types::{Message, ToolCallRequest, ToolDefinition};

/// A model that replays canned AI messages and records every request.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Message>>,
    fallback: Option<Message>,
    delay: Option<Duration>,
    requests: Mutex<Vec<Vec<Message>>>,
    tools_seen: Mutex<Vec<Vec<ToolDefinition>>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: None,
            delay: None,
            requests: Mutex::new(Vec::new()),
            tools_seen: Mutex::new(Vec::new()),
        }
    }

    /// Return `message` forever once the queue is drained.
    pub fn repeating(message: Message) -> Self {
        let mut model = Self::new(Vec::new());
        model.fallback = Some(message);
        model
    }

    /// Sleep before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn tools_seen(&self) -> Vec<Vec<ToolDefinition>> {
        self.tools_seen.lock().unwrap().clone()
    }

    /// The system prompt sent with the `n`th request.
    pub fn system_prompt(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n]
            .iter()
            .find_map(|m| match m {
                Message::System { content } => Some(content.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message, AideError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.tools_seen.lock().unwrap().push(tools.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| AideError::InvalidState("script exhausted".into()))
    }
}

/// An AI message requesting the given `(id, name, arguments)` calls.
pub fn tool_calls(calls: &[(&str, &str, Value)]) -> Message {
    Message::ai_with_tool_calls(
        "",
        calls
            .iter()
            .map(|(id, name, args)| ToolCallRequest::new(*id, *name, args.clone()))
            .collect(),
    )
}

/// A tool transport with canned schemas and per-tool outputs.
pub struct ScriptedTransport {
    schemas: Vec<ToolSchema>,
    outputs: Mutex<HashMap<String, Result<Vec<String>, String>>>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
    closes: AtomicUsize,
    connected: AtomicBool,
}

impl ScriptedTransport {
    pub fn new(schemas: Vec<ToolSchema>) -> Self {
        Self {
            schemas,
            outputs: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            connected: AtomicBool::new(true),
        }
    }

    /// Content items returned by `tool`.
    pub fn with_output(self, tool: &str, items: &[&str]) -> Self {
        self.outputs.lock().unwrap().insert(
            tool.to_string(),
            Ok(items.iter().map(|s| s.to_string()).collect()),
        );
        self
    }

    /// Make `tool` fail remotely with `message`.
    pub fn with_error(self, tool: &str, message: &str) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .insert(tool.to_string(), Err(message.to_string()));
        self
    }

    pub fn schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolTransport for ScriptedTransport {
    async fn list_tools(&self) -> Result<Vec<ToolSchema>, AideError> {
        if !self.is_connected() {
            return Err(AideError::NotConnected("scripted".into()));
        }
        Ok(self.schemas.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallOutput, AideError> {
        if !self.is_connected() {
            return Err(AideError::NotConnected("scripted".into()));
        }
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        match self.outputs.lock().unwrap().get(name).cloned() {
            Some(Ok(items)) => Ok(ToolCallOutput::new(items)),
            Some(Err(message)) => Err(AideError::tool_execution(name, message)),
            None => Ok(ToolCallOutput::default()),
        }
    }

    async fn close(&self) -> Result<(), AideError> {
        self.connected.store(false, Ordering::SeqCst);
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// A schema whose parameters are all strings, all required.
pub fn string_schema(name: &str, description: &str, params: &[&str]) -> ToolSchema {
    let properties: Map<String, Value> = params
        .iter()
        .map(|p| (p.to_string(), serde_json::json!({"type": "string"})))
        .collect();
    ToolSchema::from_wire(
        name,
        Some(description.to_string()),
        &serde_json::json!({"type": "object", "properties": properties}),
    )
}
