//! Orchestration loop: model call, tool execution, repeat.

pub mod events;
pub mod runner;
pub mod state;

pub use events::{LoopEvent, LoopEventSink};
pub use runner::{LoopLimits, LoopRunner, StaticPrompt, SystemPromptSource, TurnContext, TurnOutcome};
pub use state::LoopState;
