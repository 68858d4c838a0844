//! In-process tools and the registry that exposes them as a [`crate::tool_source::ToolSource`].
//!
//! File and shell tools live in the `sandbox` crate instead (they need a
//! provisioned container), implementing [`Tool`] directly so they plug into
//! the same [`AggregateToolSource`]/[`ToolRegistry`] machinery.

mod aggregate_source;
mod registry;
#[allow(clippy::module_inception)]
mod r#trait;
pub mod todo;

pub use aggregate_source::AggregateToolSource;
pub use r#trait::Tool;
pub use registry::ToolRegistry;
pub use todo::{TodoReadTool, TodoWriteTool, TOOL_TODO_READ, TOOL_TODO_WRITE};
