//! Error types for aide.

pub mod unified;

pub use unified::{ErrorCategory, ToolErrorPayload};

use thiserror::Error;

/// Primary error type for all aide operations.
#[derive(Error, Debug)]
pub enum AideError {
    /// The tool endpoint is unreachable or of an unsupported kind.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A transport operation was attempted without a live session.
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// A tool raised while executing. Carries the raw remote message.
    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Embedding or index failure. Fatal for the turn.
    #[error("Fact store unavailable: {0}")]
    FactStoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Turn exceeded {0} model iterations")]
    IterationLimit(usize),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl AideError {
    pub fn tool_execution(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection(_) | Self::Network(_) => ErrorCategory::Transport,
            Self::NotConnected(_) | Self::InvalidState(_) => ErrorCategory::Sequencing,
            Self::ToolExecution { .. } | Self::UnknownTool(_) => ErrorCategory::ToolExecution,
            Self::InvalidArgument(_) => ErrorCategory::InvalidArgument,
            Self::FactStoreUnavailable(_) => ErrorCategory::Memory,
            Self::Configuration(_) | Self::Yaml(_) => ErrorCategory::Configuration,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Api { .. } => ErrorCategory::Model,
            Self::Io(_) | Self::Serialization(_) => ErrorCategory::Io,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Cancelled(_) => ErrorCategory::Cancelled,
            Self::IterationLimit(_) => ErrorCategory::Limit,
        }
    }

    /// Whether the tool-dispatch boundary turns this error into a Tool message
    /// instead of aborting the turn.
    pub fn is_tool_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::ToolExecution | ErrorCategory::InvalidArgument | ErrorCategory::Timeout
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AideError>;
