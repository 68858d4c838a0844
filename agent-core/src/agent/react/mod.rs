//! ReAct nodes: the three steps of the think/act/observe loop.
//!
//! - [`ThinkNode`]: calls the LLM with current messages and tool specs; may
//!   produce tool calls.
//! - [`ActNode`]: executes the round's tool calls via a [`crate::tool_source::ToolSource`].
//! - [`ObserveNode`]: folds tool results into messages and clears round state.
//!
//! [`tools_condition`] is the router used on the conditional edge out of
//! `think`: tool calls present → `act`, otherwise → `END`. Graph assembly
//! (wiring these into a compiled graph alongside the compression subgraph)
//! lives in [`crate::factory`].

mod act_node;
mod observe_node;
mod think_node;

pub use act_node::ActNode;
pub use observe_node::ObserveNode;
pub use think_node::ThinkNode;

use crate::state::ThreadState;

/// Output of [`tools_condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolsConditionResult {
    /// Route to the tool execution node.
    Tools,
    /// Route to the end node.
    End,
}

impl ToolsConditionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tools => "tools",
            Self::End => crate::graph::END,
        }
    }
}

/// Conditional routing out of `think`: if tool_calls are present, route to
/// `act`; otherwise the turn is done.
pub fn tools_condition(state: &ThreadState) -> ToolsConditionResult {
    if state.tool_calls.is_empty() {
        ToolsConditionResult::End
    } else {
        ToolsConditionResult::Tools
    }
}
