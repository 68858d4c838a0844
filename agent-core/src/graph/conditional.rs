//! Conditional routing: a node's static edge can be replaced by a router
//! function that inspects the post-run state and picks among named targets.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A function from state to a routing key (looked up in a node's path map).
pub type ConditionalRouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// One node's outgoing routing: either a fixed next node, or a router plus
/// the map from routing key to target node id (or `END`).
pub enum NextEntry<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    Fixed(String),
    Conditional {
        router: ConditionalRouterFn<S>,
        path_map: HashMap<String, String>,
    },
}

/// Helper used by [`crate::graph::StateGraph::add_conditional_edges`] callers
/// that want to build a path map inline.
pub struct ConditionalRouter;

impl ConditionalRouter {
    pub fn path_map(pairs: impl IntoIterator<Item = (&'static str, &'static str)>) -> HashMap<String, String> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
