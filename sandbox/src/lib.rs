//! Shared Sandbox: one long-lived, resource-limited Docker container shared
//! by every user, with per-user filesystem isolation via subdirectory
//! pinning (`/<root>/<user_id>/`). Exposes `ensure`/`exec`/`put_file`/
//! `get_file`/`list`/`delete`, plus ready-made [`agent_core::tools::Tool`]
//! implementations (`shell_exec`, `write_file`, `read_file`) that route
//! through it.
//!
//! ## Main modules
//!
//! - [`config`]: [`config::SandboxConfig`] — resource policy read from the
//!   process environment.
//! - [`state`]: [`state::SandboxState`] — the sandbox lifecycle states.
//! - [`sandbox`]: [`sandbox::SharedSandbox`] — the `bollard`-backed
//!   implementation.
//! - [`path_safety`]: the workspace-escape check every path operation runs.
//! - [`tools`]: [`tools::ShellExecTool`], [`tools::WriteFileTool`],
//!   [`tools::ReadFileTool`].
//! - [`error`]: [`error::SandboxError`].

pub mod config;
pub mod error;
pub mod path_safety;
pub mod sandbox;
pub mod state;
pub mod tools;

pub use config::SandboxConfig;
pub use error::SandboxError;
pub use sandbox::{ExecOutput, ListEntry, SharedSandbox};
pub use state::SandboxState;
pub use tools::{ReadFileTool, ShellExecTool, WriteFileTool};
