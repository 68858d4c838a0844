//! The [`Tool`] trait: one callable capability the LLM can invoke.

use async_trait::async_trait;

use crate::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

/// A single tool that can be called by the LLM.
///
/// Tools are registered into a [`crate::tools::ToolRegistry`] and exposed to the
/// model via [`crate::tools::AggregateToolSource`], which implements
/// [`crate::tool_source::ToolSource`] by delegating to the registry.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use agent_core::tools::Tool;
/// use agent_core::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
///
/// struct MyTool;
///
/// #[async_trait]
/// impl Tool for MyTool {
///     fn name(&self) -> &str { "my_tool" }
///
///     fn spec(&self) -> ToolSpec {
///         ToolSpec {
///             name: "my_tool".to_string(),
///             description: Some("A sample tool".to_string()),
///             input_schema: serde_json::json!({}),
///         }
///     }
///
///     async fn call(
///         &self,
///         _args: Value,
///         _ctx: Option<&ToolCallContext>,
///     ) -> Result<ToolCallContent, ToolSourceError> {
///         Ok(ToolCallContent::text("tool executed"))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, used as the registry key and the LLM-facing tool name.
    fn name(&self) -> &str;

    /// Description and JSON schema surfaced to the LLM.
    fn spec(&self) -> ToolSpec;

    /// Executes the tool with validated arguments and optional call context.
    async fn call(
        &self,
        args: serde_json::Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError>;
}
