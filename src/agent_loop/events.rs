//! Events emitted while a turn runs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{Message, ToolCallRequest};

/// Observable progress of a turn, for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEvent {
    ModelRequested {
        iteration: usize,
    },
    AiMessage {
        message: Message,
    },
    ToolStarted {
        call: ToolCallRequest,
    },
    ToolFinished {
        call_id: String,
        tool_name: String,
        content: serde_json::Value,
        is_error: bool,
    },
    Terminated {
        iterations: usize,
    },
}

/// Callback receiving loop events.
pub type LoopEventSink = Arc<dyn Fn(LoopEvent) + Send + Sync>;
