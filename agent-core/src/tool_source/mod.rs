//! Tool discovery and invocation boundary.
//!
//! [`ToolSource`] is what [`crate::agent::react::ActNode`] calls against; it
//! doesn't know whether tools are in-process ([`crate::tools::AggregateToolSource`])
//! or sandbox-backed (the `sandbox` crate's tool source). [`ToolCallContext`]
//! carries the per-call, per-thread context a tool may need.

mod context;

pub use context::ToolCallContext;

use async_trait::async_trait;

/// JSON-schema description of a tool, as surfaced to the LLM.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

/// Successful tool output.
#[derive(Debug, Clone)]
pub struct ToolCallContent {
    pub text: String,
}

impl ToolCallContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Failure modes for tool discovery/invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolSourceError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    Execution(String),
}

/// A set of tools the agent can call.
///
/// Implementations: [`crate::tools::AggregateToolSource`] (in-process tools,
/// e.g. the todo-list middleware), and the `sandbox` crate's tool source
/// (shell/file tools routed through a provisioned container).
#[async_trait]
pub trait ToolSource: Send + Sync {
    /// Lists the tools available, for building the LLM's tool schema.
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError>;

    /// Calls a tool by name with no per-call context.
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolCallContent, ToolSourceError>;

    /// Calls a tool by name with the current step's context (recent messages,
    /// thread/user id). Default delegates to [`ToolSource::call_tool`].
    async fn call_tool_with_context(
        &self,
        name: &str,
        arguments: serde_json::Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        self.call_tool(name, arguments).await
    }

    /// Sets context to be used by subsequent calls that don't pass one explicitly.
    /// Default is a no-op; sources that don't need context can ignore this.
    fn set_call_context(&self, _ctx: Option<ToolCallContext>) {}
}
