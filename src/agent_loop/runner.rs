//! The tool-calling loop.
//!
//! One turn alternates model calls and tool execution until the model
//! answers without requesting tools. Calls are strictly sequential: one model
//! call or one tool call in flight at a time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::events::{LoopEvent, LoopEventSink};
use super::state::LoopState;
use crate::error::{AideError, ToolErrorPayload};
use crate::model::ChatModel;
use crate::tools::{ToolExecutionContext, ToolRegistry};
use crate::types::{Message, ToolCallRequest, ToolDefinition};
use crate::util::run_bounded;

/// Produces the system prompt. Asked again on every model call.
#[async_trait]
pub trait SystemPromptSource: Send + Sync {
    async fn system_prompt(&self) -> Result<String, AideError>;
}

/// A fixed prompt.
#[derive(Debug, Clone, Default)]
pub struct StaticPrompt(pub String);

#[async_trait]
impl SystemPromptSource for StaticPrompt {
    async fn system_prompt(&self) -> Result<String, AideError> {
        Ok(self.0.clone())
    }
}

/// Bounds on a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopLimits {
    /// Model calls allowed per turn.
    pub max_iterations: usize,
    pub model_timeout: Duration,
    pub tool_timeout: Duration,
}

impl Default for LoopLimits {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            model_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(60),
        }
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// The final AI message.
    pub reply: Message,
    /// Model calls made.
    pub iterations: usize,
    /// Messages appended to history, including the human input.
    pub appended: usize,
}

/// Mutable bookkeeping for one turn.
#[derive(Debug)]
pub struct TurnContext {
    pub iterations: usize,
    pub cancel: CancellationToken,
}

impl TurnContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            iterations: 0,
            cancel,
        }
    }
}

pub struct LoopRunner {
    model: Arc<dyn ChatModel>,
    registry: Arc<ToolRegistry>,
    prompt: Arc<dyn SystemPromptSource>,
    definitions: Vec<ToolDefinition>,
    limits: LoopLimits,
    sink: Option<LoopEventSink>,
}

impl LoopRunner {
    pub fn new(
        model: Arc<dyn ChatModel>,
        registry: Arc<ToolRegistry>,
        prompt: Arc<dyn SystemPromptSource>,
    ) -> Self {
        let definitions = registry.definitions();
        Self {
            model,
            registry,
            prompt,
            definitions,
            limits: LoopLimits::default(),
            sink: None,
        }
    }

    pub fn with_limits(mut self, limits: LoopLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_event_sink(mut self, sink: LoopEventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn limits(&self) -> &LoopLimits {
        &self.limits
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    fn emit(&self, event: LoopEvent) {
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }

    /// Append `input` and drive the loop until the model stops requesting
    /// tools.
    pub async fn run_turn(
        &self,
        history: &mut Vec<Message>,
        input: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, AideError> {
        let start = history.len();
        history.push(Message::human(input));

        let mut ctx = TurnContext::new(cancel.clone());
        let mut state = LoopState::AwaitingModel;
        while !state.is_terminated() {
            state = self.step(state, history, &mut ctx).await?;
        }

        let reply = history
            .last()
            .cloned()
            .ok_or_else(|| AideError::InvalidState("turn ended with empty history".into()))?;
        self.emit(LoopEvent::Terminated {
            iterations: ctx.iterations,
        });
        Ok(TurnOutcome {
            reply,
            iterations: ctx.iterations,
            appended: history.len() - start,
        })
    }

    /// Perform exactly one transition.
    pub async fn step(
        &self,
        state: LoopState,
        history: &mut Vec<Message>,
        ctx: &mut TurnContext,
    ) -> Result<LoopState, AideError> {
        tracing::debug!(state = state.name(), iteration = ctx.iterations, "loop step");
        match state {
            LoopState::AwaitingModel => self.call_model(history, ctx).await,
            LoopState::ExecutingTools { pending } => {
                self.execute_tools(pending, history, ctx).await?;
                Ok(LoopState::AwaitingModel)
            }
            LoopState::Terminated => Ok(LoopState::Terminated),
        }
    }

    async fn call_model(
        &self,
        history: &mut Vec<Message>,
        ctx: &mut TurnContext,
    ) -> Result<LoopState, AideError> {
        if ctx.iterations >= self.limits.max_iterations {
            return Err(AideError::IterationLimit(self.limits.max_iterations));
        }
        ctx.iterations += 1;
        self.emit(LoopEvent::ModelRequested {
            iteration: ctx.iterations,
        });

        let system = run_bounded(
            self.limits.tool_timeout,
            &ctx.cancel,
            "system prompt",
            self.prompt.system_prompt(),
        )
        .await?;

        let mut request = Vec::with_capacity(history.len() + 1);
        request.push(Message::system(system));
        request.extend(history.iter().filter(|m| !matches!(m, Message::System { .. })).cloned());

        let response = run_bounded(
            self.limits.model_timeout,
            &ctx.cancel,
            "model call",
            self.model.invoke(&request, &self.definitions),
        )
        .await?;

        let (content, tool_calls) = match response {
            Message::Ai {
                content,
                tool_calls,
            } => (content, tool_calls),
            other => {
                return Err(AideError::InvalidState(format!(
                    "model returned a {} message",
                    other.role()
                )))
            }
        };
        let tool_calls: Vec<ToolCallRequest> = tool_calls
            .into_iter()
            .map(|mut call| {
                if call.id.is_empty() {
                    call.id = uuid::Uuid::new_v4().to_string();
                }
                call
            })
            .collect();

        let message = Message::ai_with_tool_calls(content, tool_calls.clone());
        history.push(message.clone());
        self.emit(LoopEvent::AiMessage { message });

        if tool_calls.is_empty() {
            tracing::debug!(iteration = ctx.iterations, "model answered, turn complete");
            return Ok(LoopState::Terminated);
        }
        tracing::debug!(iteration = ctx.iterations, count = tool_calls.len(), "model requested tools");
        Ok(LoopState::ExecutingTools {
            pending: VecDeque::from(tool_calls),
        })
    }

    /// Run pending calls in order, appending one Tool message per call.
    ///
    /// Recoverable failures become error payloads and the turn goes on. On a
    /// fatal failure or cancellation every remaining call still gets an
    /// error payload before the error is returned, so each request stays
    /// paired with a result.
    async fn execute_tools(
        &self,
        mut pending: VecDeque<ToolCallRequest>,
        history: &mut Vec<Message>,
        ctx: &mut TurnContext,
    ) -> Result<(), AideError> {
        while let Some(call) = pending.pop_front() {
            if ctx.cancel.is_cancelled() {
                let err = AideError::Cancelled(format!("tool {}", call.name));
                self.abandon(call, pending, history, &err);
                return Err(err);
            }

            self.emit(LoopEvent::ToolStarted { call: call.clone() });
            tracing::debug!(tool = %call.name, call_id = %call.id, "executing tool");

            let tool_ctx = ToolExecutionContext::new(call.id.clone(), ctx.cancel.child_token());
            let outcome = run_bounded(
                self.limits.tool_timeout,
                &ctx.cancel,
                &call.name,
                self.registry.invoke(&call.name, &call.arguments, &tool_ctx),
            )
            .await;

            match outcome {
                Ok(result) => self.append_result(history, &call, result.to_json(), false),
                Err(err) if err.is_tool_recoverable() => {
                    tracing::warn!(tool = %call.name, error = %err, "tool call failed");
                    let payload = ToolErrorPayload::from_error(&call.name, &err).to_value();
                    self.append_result(history, &call, payload, true);
                }
                Err(err) => {
                    tracing::error!(tool = %call.name, error = %err, "tool call aborted the turn");
                    self.abandon(call, pending, history, &err);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn abandon(
        &self,
        call: ToolCallRequest,
        pending: VecDeque<ToolCallRequest>,
        history: &mut Vec<Message>,
        err: &AideError,
    ) {
        for call in std::iter::once(call).chain(pending) {
            let payload = ToolErrorPayload::from_error(&call.name, err).to_value();
            self.append_result(history, &call, payload, true);
        }
    }

    fn append_result(
        &self,
        history: &mut Vec<Message>,
        call: &ToolCallRequest,
        content: serde_json::Value,
        is_error: bool,
    ) {
        history.push(Message::tool_result(
            call.id.clone(),
            call.name.clone(),
            content.clone(),
            is_error,
        ));
        self.emit(LoopEvent::ToolFinished {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            content,
            is_error,
        });
    }
}

impl std::fmt::Debug for LoopRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopRunner")
            .field("model", &self.model.model_id())
            .field("tools", &self.registry.names())
            .field("limits", &self.limits)
            .finish()
    }
}
