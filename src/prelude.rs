//! Convenience re-exports for common use.

pub use crate::agent::{AgentSession, Conversation};
pub use crate::agent_loop::{LoopEvent, LoopLimits, LoopRunner, TurnOutcome};
pub use crate::config::AideConfig;
pub use crate::error::{AideError, ErrorCategory, Result};
pub use crate::instructions::{InstructionCompiler, InstructionSources};
pub use crate::mcp::{with_session, McpSession, ToolEndpoint, ToolSchema, ToolTransport};
pub use crate::memory::{Fact, FactCategory, FactQuery, FactStore};
pub use crate::model::ChatModel;
#[cfg(feature = "gemini")]
pub use crate::model::GeminiModel;
pub use crate::tools::{NativeTool, Tool, ToolArguments, ToolRegistry, ToolResult};
pub use crate::types::{GenerationSettings, Message, Role, ToolCallRequest, ToolDefinition};
