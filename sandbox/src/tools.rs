//! Sandbox-backed tools: `shell_exec`, `write_file`, `read_file`. Each
//! implements [`agent_core::tools::Tool`] the same shape as the in-process
//! todo tools, routed through [`SharedSandbox`] instead of local
//! `std::fs`/`tokio::process::Command` — the sandbox *is* the
//! process/filesystem boundary for these.

use std::sync::Arc;

use agent_core::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use agent_core::tools::Tool;
use async_trait::async_trait;
use serde_json::json;

use crate::sandbox::SharedSandbox;

const READ_FILE_DISPLAY_CAP: usize = 16 * 1024;

fn user_id_of(ctx: Option<&ToolCallContext>) -> Result<String, ToolSourceError> {
    ctx.and_then(|c| c.user_id.clone())
        .ok_or_else(|| ToolSourceError::InvalidInput("missing user_id in call context".to_string()))
}

/// Runs a shell command in the caller's sandbox workspace.
pub struct ShellExecTool {
    sandbox: Arc<SharedSandbox>,
}

impl ShellExecTool {
    pub fn new(sandbox: Arc<SharedSandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ShellExecTool {
    fn name(&self) -> &str {
        "shell_exec"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "shell_exec".to_string(),
            description: Some("Run a shell command in the sandboxed workspace.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "command": { "type": "string" },
                    "timeout": { "type": "integer" }
                },
                "required": ["command"]
            }),
        }
    }

    async fn call(&self, args: serde_json::Value, ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let user_id = user_id_of(ctx)?;
        let command = args
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidInput("missing 'command'".to_string()))?;
        let timeout = args
            .get("timeout")
            .and_then(|v| v.as_u64())
            .map(std::time::Duration::from_secs);

        let output = self
            .sandbox
            .exec(&user_id, command, timeout)
            .await
            .map_err(|e| ToolSourceError::Execution(e.to_string()))?;

        let mut text = String::new();
        text.push_str(&output.stdout);
        if !output.stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&output.stderr);
        }
        if output.truncated {
            text.push_str("\n[truncated]");
        }
        if output.exit_code != 0 {
            text.push_str(&format!("\n[exit code {}]", output.exit_code));
        }
        Ok(ToolCallContent::text(text))
    }
}

/// Writes (or appends to) a file in the caller's sandbox workspace.
pub struct WriteFileTool {
    sandbox: Arc<SharedSandbox>,
}

impl WriteFileTool {
    pub fn new(sandbox: Arc<SharedSandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "write_file".to_string(),
            description: Some("Write or append to a file in the sandboxed workspace.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "content": { "type": "string" },
                    "mode": { "type": "string", "enum": ["overwrite", "append"] }
                },
                "required": ["path", "content"]
            }),
        }
    }

    async fn call(&self, args: serde_json::Value, ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let user_id = user_id_of(ctx)?;
        let path = args
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidInput("missing 'path'".to_string()))?;
        let content = args
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidInput("missing 'content'".to_string()))?;
        let append = args.get("mode").and_then(|v| v.as_str()) == Some("append");

        let bytes = if append {
            let mut existing = self.sandbox.get_file(&user_id, path).await.unwrap_or_default();
            existing.extend_from_slice(content.as_bytes());
            existing
        } else {
            content.as_bytes().to_vec()
        };

        self.sandbox
            .put_file(&user_id, path, &bytes)
            .await
            .map_err(|e| ToolSourceError::Execution(e.to_string()))?;
        Ok(ToolCallContent::text(format!("wrote {} bytes to {}", bytes.len(), path)))
    }
}

/// Reads a file from the caller's sandbox workspace, truncating the display
/// output to a small cap.
pub struct ReadFileTool {
    sandbox: Arc<SharedSandbox>,
}

impl ReadFileTool {
    pub fn new(sandbox: Arc<SharedSandbox>) -> Self {
        Self { sandbox }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "read_file".to_string(),
            description: Some("Read a file from the sandboxed workspace.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": { "path": { "type": "string" } },
                "required": ["path"]
            }),
        }
    }

    async fn call(&self, args: serde_json::Value, ctx: Option<&ToolCallContext>) -> Result<ToolCallContent, ToolSourceError> {
        let user_id = user_id_of(ctx)?;
        let path = args
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolSourceError::InvalidInput("missing 'path'".to_string()))?;

        let bytes = self
            .sandbox
            .get_file(&user_id, path)
            .await
            .map_err(|e| ToolSourceError::Execution(e.to_string()))?;
        let mut text = String::from_utf8_lossy(&bytes).into_owned();
        if text.len() > READ_FILE_DISPLAY_CAP {
            text.truncate(READ_FILE_DISPLAY_CAP);
            text.push_str("\n[truncated]");
        }
        Ok(ToolCallContent::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_of_requires_context() {
        let err = user_id_of(None).unwrap_err();
        assert!(matches!(err, ToolSourceError::InvalidInput(_)));
    }

    #[test]
    fn user_id_of_reads_ctx_user_id() {
        let ctx = ToolCallContext::default().with_ids(None, Some("user-7".to_string()));
        assert_eq!(user_id_of(Some(&ctx)).unwrap(), "user-7");
    }
}
