//! Session tool registry.
//!
//! Collision policy: a native tool always wins over a remote tool of the same
//! name, whichever was registered first; the remote one is dropped with a
//! warning. Two natives or two remotes sharing a name is a configuration
//! error.

use std::sync::Arc;

use super::adapter::adapt;
use super::result::ToolResult;
use super::tool::{Tool, ToolExecutionContext, ToolOrigin};
use crate::error::AideError;
use crate::mcp::{ToolSchema, ToolTransport};
use crate::types::ToolDefinition;

/// Tools available to the loop, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.name() == name)
    }

    /// Add an in-process tool. Replaces a remote tool of the same name.
    pub fn register_native(&mut self, tool: Arc<dyn Tool>) -> Result<(), AideError> {
        if let Some(idx) = self.position(tool.name()) {
            if self.tools[idx].origin() == ToolOrigin::Native {
                return Err(AideError::Configuration(format!(
                    "native tool '{}' registered twice",
                    tool.name()
                )));
            }
            tracing::warn!(tool = %tool.name(), "native tool shadows remote tool of the same name");
            self.tools.remove(idx);
        }
        tracing::debug!(tool = %tool.name(), "registered native tool");
        self.tools.push(tool);
        Ok(())
    }

    /// Add a remote tool. Returns `false` when a native tool already owns the
    /// name and the remote one was skipped.
    pub fn register_remote(&mut self, tool: Arc<dyn Tool>) -> Result<bool, AideError> {
        if let Some(idx) = self.position(tool.name()) {
            if self.tools[idx].origin() == ToolOrigin::Native {
                tracing::warn!(tool = %tool.name(), "remote tool skipped, a native tool owns the name");
                return Ok(false);
            }
            return Err(AideError::Configuration(format!(
                "tool server declares '{}' more than once",
                tool.name()
            )));
        }
        self.tools.push(tool);
        Ok(true)
    }

    /// Adapt and register every schema from one transport.
    pub fn load_remote(
        &mut self,
        schemas: &[ToolSchema],
        transport: Arc<dyn ToolTransport>,
    ) -> Result<usize, AideError> {
        let mut loaded = 0;
        for schema in schemas {
            let tool = adapt(schema, Arc::clone(&transport));
            if self.register_remote(Arc::new(tool))? {
                loaded += 1;
            }
        }
        tracing::debug!(count = loaded, "loaded remote tools");
        Ok(loaded)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Model-facing definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Validate and run the named tool.
    pub async fn invoke(
        &self,
        name: &str,
        raw: &serde_json::Value,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResult, AideError> {
        let tool = self
            .get(name)
            .ok_or_else(|| AideError::UnknownTool(name.to_string()))?;
        tool.call(raw, ctx).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::shape::ArgumentShape;
    use crate::tools::tool::NativeTool;
    use crate::mcp::McpSession;
    use serde_json::json;

    fn native(name: &str) -> Arc<dyn Tool> {
        Arc::new(NativeTool::new(name, "native", ArgumentShape::new(), |_, _| async {
            Ok(ToolResult::text("native"))
        }))
    }

    fn remote_schema(name: &str) -> ToolSchema {
        ToolSchema::from_wire(name, Some("remote".into()), &json!({"properties": {}}))
    }

    fn detached() -> Arc<dyn ToolTransport> {
        Arc::new(McpSession::detached("test"))
    }

    #[test]
    fn native_wins_when_registered_first() {
        let mut registry = ToolRegistry::new();
        registry.register_native(native("query_user_fact")).unwrap();
        let loaded = registry
            .load_remote(&[remote_schema("query_user_fact"), remote_schema("get_docs")], detached())
            .unwrap();
        assert_eq!(loaded, 1);
        assert_eq!(registry.names(), vec!["query_user_fact", "get_docs"]);
        assert_eq!(registry.get("query_user_fact").unwrap().origin(), ToolOrigin::Native);
    }

    #[test]
    fn native_wins_when_registered_after_remote() {
        let mut registry = ToolRegistry::new();
        registry.load_remote(&[remote_schema("get_docs")], detached()).unwrap();
        registry.register_native(native("get_docs")).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("get_docs").unwrap().origin(), ToolOrigin::Native);
    }

    #[test]
    fn duplicate_names_within_one_origin_are_configuration_errors() {
        let mut registry = ToolRegistry::new();
        registry.register_native(native("a")).unwrap();
        assert!(matches!(
            registry.register_native(native("a")),
            Err(AideError::Configuration(_))
        ));

        let err = registry
            .load_remote(&[remote_schema("b"), remote_schema("b")], detached())
            .unwrap_err();
        assert!(matches!(err, AideError::Configuration(_)));
    }

    #[tokio::test]
    async fn invoking_unknown_tool_fails_with_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .invoke("missing", &json!({}), &ToolExecutionContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AideError::UnknownTool(name) if name == "missing"));
    }
}
