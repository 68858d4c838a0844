//! A [`ToolSource`] backed by an in-process [`ToolRegistry`].

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSource, ToolSourceError, ToolSpec};
use crate::tools::{Tool, ToolRegistry};

/// Exposes a [`ToolRegistry`] as a [`ToolSource`].
///
/// This is the in-process middle layer: middleware like the todo-list tools
/// register here, then [`crate::agent::react::ActNode`] talks only to the
/// `ToolSource` trait, unaware whether tools run in-process or (as in the
/// `sandbox` crate) inside a provisioned container.
#[derive(Clone)]
pub struct AggregateToolSource {
    registry: Arc<ToolRegistry>,
    call_context: Arc<Mutex<Option<ToolCallContext>>>,
}

impl Default for AggregateToolSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateToolSource {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ToolRegistry::new()),
            call_context: Arc::new(Mutex::new(None)),
        }
    }

    /// Registers a tool. Named `register_async` for symmetry with call sites
    /// that build a source inside an async constructor; registration itself
    /// does not need to await anything.
    pub async fn register_async(&self, tool: Box<dyn Tool>) {
        self.registry.register(tool);
    }

    fn current_context(&self) -> Option<ToolCallContext> {
        self.call_context.lock().expect("call_context lock poisoned").clone()
    }
}

#[async_trait]
impl ToolSource for AggregateToolSource {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
        Ok(self.registry.list())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let ctx = self.current_context();
        self.registry.call(name, arguments, ctx.as_ref()).await
    }

    async fn call_tool_with_context(
        &self,
        name: &str,
        arguments: serde_json::Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        self.registry.call(name, arguments, ctx).await
    }

    fn set_call_context(&self, ctx: Option<ToolCallContext>) {
        *self.call_context.lock().expect("call_context lock poisoned") = ctx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::todo::TodoWriteTool;

    #[tokio::test]
    async fn list_tools_reflects_registration() {
        let source = AggregateToolSource::new();
        source.register_async(Box::new(TodoWriteTool)).await;
        let specs = source.list_tools().await.unwrap();
        assert!(specs.iter().any(|s| s.name == "todo_write"));
    }

    #[tokio::test]
    async fn set_call_context_is_used_by_call_tool() {
        let source = AggregateToolSource::new();
        source.set_call_context(Some(ToolCallContext::new(vec![])));
        // call_tool on an unregistered name still surfaces UnknownTool, proving
        // the context path doesn't short-circuit dispatch.
        let err = source.call_tool("nope", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::UnknownTool(_)));
    }
}
