//! Tool transport over the Model Context Protocol.

pub mod client;
pub mod schema;
pub mod transport;

pub use client::{with_session, McpSession};
pub use schema::{ParamSpec, ToolSchema};
pub use transport::{ToolCallOutput, ToolEndpoint, ToolTransport};
