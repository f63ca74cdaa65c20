//! aide: a tool-calling conversational agent.
//!
//! A session binds a chat model to a set of tools (in-process memory tools
//! plus whatever a connected MCP tool server offers), compiles a layered
//! system prompt before every model call, and keeps long-term user facts in
//! an embedding-indexed store.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use aide::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> aide::error::Result<()> {
//! let config = AideConfig::load(None)?;
//! let model = Arc::new(config.gemini_model()?);
//! let mut session = AgentSession::start(&config, model).await?;
//! let outcome = session.run_turn("Remind me what I like", &CancellationToken::new()).await;
//! session.shutdown().await?;
//! println!("{}", outcome?.reply.text());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod config;
pub mod error;
pub mod instructions;
pub mod mcp;
pub mod memory;
pub mod model;
pub mod prelude;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
