//! Routing decision returned by a node.

/// What to run after a node finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Follow the graph's static edge from this node.
    Continue,
    /// Jump directly to the named node, bypassing the static edge.
    Node(String),
    /// Stop the run; the current state is the final state.
    End,
}
