//! Loop states.

use std::collections::VecDeque;

use crate::types::ToolCallRequest;

/// Where a turn is.
///
/// `AwaitingModel` is entered at the start of a turn and after each batch of
/// tool results. `ExecutingTools` holds the calls of the AI message just
/// appended, in the order the model emitted them.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    AwaitingModel,
    ExecutingTools { pending: VecDeque<ToolCallRequest> },
    Terminated,
}

impl LoopState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingModel => "awaiting_model",
            Self::ExecutingTools { .. } => "executing_tools",
            Self::Terminated => "terminated",
        }
    }
}
