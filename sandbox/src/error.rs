//! Sandbox-specific error type.
//!
//! Every fallible sandbox operation returns [`SandboxError`]; callers that
//! hand a sandbox-backed tool to [`agent_core::tools::Tool`] convert it into
//! [`agent_core::AgentError::SandboxFault`] at the boundary via `From`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox unavailable: {0}")]
    Unavailable(String),

    #[error("path escapes workspace root: {0}")]
    PathEscape(String),

    #[error("exec timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("docker engine error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<SandboxError> for agent_core::AgentError {
    fn from(e: SandboxError) -> Self {
        agent_core::AgentError::SandboxFault(e.to_string())
    }
}
