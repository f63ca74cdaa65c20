//! Error classification and the payload tool failures are surfaced with.

use serde::{Deserialize, Serialize};
use strum::Display;

use super::AideError;

/// Broad error category for routing propagation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCategory {
    Transport,
    Sequencing,
    ToolExecution,
    InvalidArgument,
    Memory,
    Configuration,
    Authentication,
    Model,
    Io,
    Timeout,
    Cancelled,
    Limit,
}

/// JSON body of a Tool message whose call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolErrorPayload {
    pub error: String,
    pub kind: ErrorCategory,
    pub tool: String,
}

impl ToolErrorPayload {
    pub fn from_error(tool: impl Into<String>, error: &AideError) -> Self {
        let message = match error {
            AideError::ToolExecution { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            error: message,
            kind: error.category(),
            tool: tool.into(),
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.error,
            "kind": self.kind,
            "tool": self.tool,
        })
    }
}
