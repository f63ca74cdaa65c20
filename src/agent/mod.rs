//! Session context: conversation history, tool set and transport lifetime.

pub mod conversation;
pub mod session;

pub use conversation::{validate_tool_pairing, Conversation};
pub use session::{AgentSession, CompiledPrompt};
