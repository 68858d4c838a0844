//! In-process map of tool name to [`Tool`] implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use crate::tools::Tool;

/// Holds registered tools by name.
///
/// Not `Clone`; wrap in `Arc` to share across an [`crate::tools::AggregateToolSource`]
/// and its callers.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Box<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.write().expect("registry lock poisoned").insert(name, tool);
    }

    pub fn list(&self) -> Vec<ToolSpec> {
        self.tools
            .read()
            .expect("registry lock poisoned")
            .values()
            .map(|t| t.spec())
            .collect()
    }

    pub async fn call(
        &self,
        name: &str,
        args: serde_json::Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        // Tools are never removed once registered, so the read guard held
        // across the call is only ever contended by other readers.
        let tools = self.tools.read().expect("registry lock poisoned");
        let tool = tools
            .get(name)
            .ok_or_else(|| ToolSourceError::UnknownTool(name.to_string()))?;
        tool.call(args, ctx).await
    }
}
