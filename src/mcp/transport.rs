//! Tool transport seam and endpoint kinds.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use super::schema::ToolSchema;
use crate::error::AideError;

/// Where the tool server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEndpoint {
    /// A local script spoken to over stdio.
    Stdio { command: String, args: Vec<String> },
    /// A remote server using the streamable HTTP transport.
    StreamableHttp { url: String },
}

impl FromStr for ToolEndpoint {
    type Err = AideError;

    /// `.py` runs under `python`, `.js` under `node`, and `http(s)://` URLs
    /// use streamable HTTP.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(Self::StreamableHttp {
                url: raw.to_string(),
            });
        }
        let command = if raw.ends_with(".py") {
            "python"
        } else if raw.ends_with(".js") {
            "node"
        } else {
            return Err(AideError::Connection(format!(
                "unsupported tool endpoint '{raw}': expected a .py or .js script or an http(s) URL"
            )));
        };
        Ok(Self::Stdio {
            command: command.to_string(),
            args: vec![raw.to_string()],
        })
    }
}

impl fmt::Display for ToolEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio { command, args } => write!(f, "{command} {}", args.join(" ")),
            Self::StreamableHttp { url } => f.write_str(url),
        }
    }
}

/// Raw output of a remote tool call: the text of each content item, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallOutput {
    pub content: Vec<String>,
}

impl ToolCallOutput {
    pub fn new(content: Vec<String>) -> Self {
        Self { content }
    }
}

/// Session with a tool-hosting process.
///
/// Calls are never issued concurrently on one transport; the orchestration
/// loop dispatches them one at a time.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// List tool schemas in server declaration order.
    async fn list_tools(&self) -> Result<Vec<ToolSchema>, AideError>;

    /// Execute a named tool. Remote failures surface as `ToolExecution`.
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ToolCallOutput, AideError>;

    /// Release all transport resources. Idempotent.
    async fn close(&self) -> Result<(), AideError>;

    fn is_connected(&self) -> bool;
}
