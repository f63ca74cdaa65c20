//! Explicit session context: everything one conversation needs, built once
//! and torn down once.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::conversation::Conversation;
use crate::agent_loop::{LoopEventSink, LoopLimits, LoopRunner, SystemPromptSource, TurnOutcome};
use crate::config::AideConfig;
use crate::error::AideError;
use crate::instructions::{domain_line, InstructionCompiler, InstructionSources};
use crate::mcp::{McpSession, ToolEndpoint, ToolTransport};
use crate::memory::FactStore;
use crate::model::ChatModel;
use crate::tools::builtin::memory_tools;
use crate::tools::ToolRegistry;
use crate::types::Message;

/// System prompt compiled from the instruction tiers on every model call.
pub struct CompiledPrompt {
    compiler: InstructionCompiler,
    domain: Vec<String>,
}

impl CompiledPrompt {
    pub fn new(compiler: InstructionCompiler, domain: Vec<String>) -> Self {
        Self { compiler, domain }
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }
}

#[async_trait]
impl SystemPromptSource for CompiledPrompt {
    async fn system_prompt(&self) -> Result<String, AideError> {
        self.compiler.compile(&self.domain).await
    }
}

/// One assistant conversation bound to a model, a tool set and an optional
/// tool server connection.
///
/// Call [`AgentSession::shutdown`] when done; it closes the transport and is
/// safe to call more than once.
pub struct AgentSession {
    runner: LoopRunner,
    conversation: Conversation,
    transport: Option<Arc<dyn ToolTransport>>,
    closed: bool,
}

impl AgentSession {
    /// Open the fact store, register native tools, connect the configured
    /// tool server and load its tools.
    ///
    /// A transport opened here is closed again if any later step fails.
    pub async fn start(config: &AideConfig, model: Arc<dyn ChatModel>) -> Result<Self, AideError> {
        let store = Arc::new(FactStore::open(&config.fact_store_path, config.embedder()?).await?);
        let sources = InstructionSources::new(&config.instruction_dir, &config.user_id);

        let mut registry = ToolRegistry::new();
        for tool in memory_tools(Arc::clone(&store), sources.clone()) {
            registry.register_native(tool)?;
        }

        let transport: Option<Arc<dyn ToolTransport>> = match &config.server {
            Some(server) => {
                let endpoint: ToolEndpoint = server.parse()?;
                let session: Arc<dyn ToolTransport> = Arc::new(McpSession::connect(&endpoint).await?);
                if let Err(e) = load_remote_tools(&mut registry, &session).await {
                    if let Err(close_err) = session.close().await {
                        tracing::warn!(error = %close_err, "failed to close tool session after setup error");
                    }
                    return Err(e);
                }
                Some(session)
            }
            None => None,
        };

        let compiler = InstructionCompiler::new(sources)
            .with_fact_store(store)
            .with_preference_query(config.preference_query.clone(), config.preference_limit);

        Ok(Self::from_parts(model, registry, compiler, transport).with_limits(config.limits()))
    }

    /// Assemble a session from already-built parts.
    ///
    /// Domain instructions are derived once, here, from every registered
    /// tool.
    pub fn from_parts(
        model: Arc<dyn ChatModel>,
        registry: ToolRegistry,
        compiler: InstructionCompiler,
        transport: Option<Arc<dyn ToolTransport>>,
    ) -> Self {
        let domain = registry
            .definitions()
            .iter()
            .map(|d| domain_line(&d.name, &d.description))
            .collect();
        let prompt = Arc::new(CompiledPrompt::new(compiler, domain));
        Self {
            runner: LoopRunner::new(model, Arc::new(registry), prompt),
            conversation: Conversation::new(),
            transport,
            closed: false,
        }
    }

    pub fn with_limits(mut self, limits: LoopLimits) -> Self {
        self.runner = self.runner.with_limits(limits);
        self
    }

    pub fn with_event_sink(mut self, sink: LoopEventSink) -> Self {
        self.runner = self.runner.with_event_sink(sink);
        self
    }

    pub fn history(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.runner.registry()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Run one turn. If the turn fails, history is rolled back to where it
    /// was before `input` was appended.
    pub async fn run_turn(
        &mut self,
        input: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, AideError> {
        if self.closed {
            return Err(AideError::InvalidState("session is shut down".into()));
        }
        let start = self.conversation.len();
        let outcome = self
            .runner
            .run_turn(self.conversation.messages_mut(), input, cancel)
            .await;
        if let Err(e) = &outcome {
            tracing::debug!(error = %e, discarded = self.conversation.len() - start, "turn failed, history rolled back");
            self.conversation.truncate(start);
        }
        outcome
    }

    /// Close the tool transport. Later turns fail with `InvalidState`.
    pub async fn shutdown(&mut self) -> Result<(), AideError> {
        self.closed = true;
        match self.transport.take() {
            Some(transport) => transport.close().await,
            None => Ok(()),
        }
    }
}

async fn load_remote_tools(
    registry: &mut ToolRegistry,
    transport: &Arc<dyn ToolTransport>,
) -> Result<usize, AideError> {
    let schemas = transport.list_tools().await?;
    registry.load_remote(&schemas, Arc::clone(transport))
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("runner", &self.runner)
            .field("messages", &self.conversation.len())
            .field("connected", &self.transport.as_ref().map(|t| t.is_connected()))
            .field("closed", &self.closed)
            .finish()
    }
}
