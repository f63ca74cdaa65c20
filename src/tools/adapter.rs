//! Remote tools: wire schemas adapted into invocable tools.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::result::ToolResult;
use super::shape::ArgumentShape;
use super::tool::{Tool, ToolExecutionContext, ToolOrigin};
use crate::error::AideError;
use crate::mcp::{ToolSchema, ToolTransport};

/// A tool that forwards to a tool server over its transport.
pub struct RemoteTool {
    name: String,
    description: String,
    shape: ArgumentShape,
    transport: Arc<dyn ToolTransport>,
}

/// Build an invocable tool from a wire schema. No I/O happens until the tool
/// is invoked.
pub fn adapt(schema: &ToolSchema, transport: Arc<dyn ToolTransport>) -> RemoteTool {
    RemoteTool {
        name: schema.name.clone(),
        description: schema.description.clone(),
        shape: ArgumentShape::from_schema(schema),
        transport,
    }
}

#[async_trait]
impl Tool for RemoteTool {
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
        ToolOrigin::Remote
    }

    async fn invoke(
        &self,
        args: ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<ToolResult, AideError> {
        let output = self.transport.call_tool(&self.name, args.into_map()).await?;
        Ok(ToolResult::from_content_items(&output.content))
    }
}

impl std::fmt::Debug for RemoteTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
