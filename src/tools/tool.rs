//! Tool trait and closure-based native tools.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio_util::sync::CancellationToken;

use super::arguments::ToolArguments;
use super::result::ToolResult;
use super::shape::ArgumentShape;
use crate::error::AideError;
use crate::types::ToolDefinition;

/// Where a tool is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToolOrigin {
    Native,
    Remote,
}

/// Context available during tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    pub tool_call_id: String,
    pub cancel: CancellationToken,
}

impl ToolExecutionContext {
    pub fn new(tool_call_id: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            cancel,
        }
    }
}

/// A named, described, shape-validated callable.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn shape(&self) -> &ArgumentShape;

    fn origin(&self) -> ToolOrigin;

    /// Execute with already validated arguments.
    async fn invoke(
        &self,
        args: ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResult, AideError>;

    /// Validate raw model arguments against the shape, then invoke.
    async fn call(
        &self,
        raw: &serde_json::Value,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResult, AideError> {
        let args = self.shape().validate(raw)?;
        self.invoke(args, ctx).await
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.shape().to_json_schema(),
        }
    }
}

type ToolHandler = dyn Fn(
        ToolArguments,
        ToolExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<ToolResult, AideError>> + Send>>
    + Send
    + Sync;

/// Tool implemented in-process from a closure.
pub struct NativeTool {
    name: String,
    description: String,
    shape: ArgumentShape,
    handler: Arc<ToolHandler>,
}

impl NativeTool {
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        shape: ArgumentShape,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolResult, AideError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            shape,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for NativeTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn shape(&self) -> &ArgumentShape {
        &self.shape
    }

    fn origin(&self) -> ToolOrigin {
        ToolOrigin::Native
    }

    async fn invoke(
        &self,
        args: ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResult, AideError> {
        (self.handler)(args, ctx.clone()).await
    }
}

impl std::fmt::Debug for NativeTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
