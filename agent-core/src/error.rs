//! Crate-wide error type and error-kind taxonomy.
//!
//! [`AgentError`] wraps every failure mode that can surface from a turn: graph
//! compilation, LLM transport, tool execution, checkpoint storage, and sandbox
//! plumbing. [`ErrorKind`] is the stable, serializable tag carried in
//! [`crate::stream::StreamEvent::Error`] so callers can branch on failure class
//! without string-matching a message.

use thiserror::Error;

/// Stable classification of an [`AgentError`], exposed to callers over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Thread or user id missing or malformed.
    InvalidThread,
    /// Turn input failed validation (empty message, oversized payload, ...).
    InvalidInput,
    /// Agent graph failed to compile (bad node wiring).
    GraphCompilation,
    /// A graph node returned an error mid-run.
    NodeExecution,
    /// The configured LLM backend returned an error or malformed response.
    LlmBackend,
    /// LLM call exceeded its deadline.
    LlmTimeout,
    /// A tool call referenced an unknown tool name.
    UnknownTool,
    /// Tool arguments failed schema validation.
    ToolInvalidArgs,
    /// Tool execution failed (process error, sandbox fault, ...).
    ToolExecution,
    /// Tool call exceeded its deadline.
    ToolTimeout,
    /// Sandbox provisioning or lifecycle operation failed.
    SandboxFault,
    /// Checkpoint read/write failed.
    CheckpointStorage,
    /// Turn recursion bound exceeded (think/act loop did not converge).
    RecursionLimit,
    /// Turn was cancelled by the caller.
    Cancelled,
    /// A turn was already running for this thread; the caller must retry later.
    ThreadBusy,
    /// Anything else.
    Internal,
}

/// Crate-wide error type.
///
/// Every fallible operation in the agent execution core returns this type (or a
/// more specific error that converts into it). [`AgentError::kind`] gives the
/// stable [`ErrorKind`] used in streamed error events.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("invalid thread: {0}")]
    InvalidThread(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("graph compilation: {0}")]
    GraphCompilation(#[from] crate::graph::CompilationError),

    #[error("node {node} failed: {source}")]
    NodeExecution {
        node: String,
        #[source]
        source: Box<AgentError>,
    },

    #[error("llm backend: {0}")]
    LlmBackend(String),

    #[error("llm call timed out after {0:?}")]
    LlmTimeout(std::time::Duration),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid tool arguments for {tool}: {detail}")]
    ToolInvalidArgs { tool: String, detail: String },

    #[error("tool {tool} failed: {detail}")]
    ToolExecution { tool: String, detail: String },

    #[error("tool {tool} timed out after {elapsed:?}")]
    ToolTimeout {
        tool: String,
        elapsed: std::time::Duration,
    },

    #[error("sandbox fault: {0}")]
    SandboxFault(String),

    #[error("checkpoint storage: {0}")]
    CheckpointStorage(String),

    #[error("recursion limit exceeded: {0} rounds")]
    RecursionLimit(usize),

    #[error("turn cancelled")]
    Cancelled,

    #[error("thread {0} is already running a turn")]
    ThreadBusy(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// The stable [`ErrorKind`] for this error, used in streamed error events.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::InvalidThread(_) => ErrorKind::InvalidThread,
            AgentError::InvalidInput(_) => ErrorKind::InvalidInput,
            AgentError::GraphCompilation(_) => ErrorKind::GraphCompilation,
            AgentError::NodeExecution { source, .. } => source.kind(),
            AgentError::LlmBackend(_) => ErrorKind::LlmBackend,
            AgentError::LlmTimeout(_) => ErrorKind::LlmTimeout,
            AgentError::UnknownTool(_) => ErrorKind::UnknownTool,
            AgentError::ToolInvalidArgs { .. } => ErrorKind::ToolInvalidArgs,
            AgentError::ToolExecution { .. } => ErrorKind::ToolExecution,
            AgentError::ToolTimeout { .. } => ErrorKind::ToolTimeout,
            AgentError::SandboxFault(_) => ErrorKind::SandboxFault,
            AgentError::CheckpointStorage(_) => ErrorKind::CheckpointStorage,
            AgentError::RecursionLimit(_) => ErrorKind::RecursionLimit,
            AgentError::Cancelled => ErrorKind::Cancelled,
            AgentError::ThreadBusy(_) => ErrorKind::ThreadBusy,
            AgentError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<crate::tool_source::ToolSourceError> for AgentError {
    fn from(e: crate::tool_source::ToolSourceError) -> Self {
        use crate::tool_source::ToolSourceError as T;
        match e {
            T::UnknownTool(name) => AgentError::UnknownTool(name),
            T::InvalidInput(detail) => AgentError::ToolInvalidArgs {
                tool: String::new(),
                detail,
            },
            T::Execution(detail) => AgentError::ToolExecution {
                tool: String::new(),
                detail,
            },
        }
    }
}

impl From<crate::memory::CheckpointError> for AgentError {
    fn from(e: crate::memory::CheckpointError) -> Self {
        AgentError::CheckpointStorage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_execution_kind_delegates_to_source() {
        let err = AgentError::NodeExecution {
            node: "think".into(),
            source: Box::new(AgentError::LlmBackend("boom".into())),
        };
        assert_eq!(err.kind(), ErrorKind::LlmBackend);
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ToolInvalidArgs).unwrap();
        assert_eq!(json, "\"tool_invalid_args\"");
    }
}
