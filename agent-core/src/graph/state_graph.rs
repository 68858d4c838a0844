//! State graph builder: add nodes and edges, then compile.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use super::compile_error::CompilationError;
use super::compiled::CompiledStateGraph;
use super::conditional::{ConditionalRouterFn, NextEntry};
use super::node_middleware::NodeMiddleware;
use super::Node;

/// Sentinel id for the graph's entry point.
pub const START: &str = "__start__";
/// Sentinel id for the graph's exit point.
pub const END: &str = "__end__";

const DEFAULT_RECURSION_LIMIT: usize = 50;

enum Edge<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    Direct(String),
    Conditional {
        router: ConditionalRouterFn<S>,
        path_map: HashMap<String, String>,
    },
}

/// Builds a graph by registering nodes and edges, then [`StateGraph::compile`]s
/// it into an immutable, runnable [`CompiledStateGraph`].
pub struct StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
    middleware: Vec<Arc<dyn NodeMiddleware<S>>>,
    recursion_limit: usize,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            middleware: Vec::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds a static edge `from -> to`. `from` may be [`START`]; `to` may be [`END`].
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.insert(from.into(), Edge::Direct(to.into()));
        self
    }

    /// Adds a conditional edge: after `from` runs (and returns `Next::Continue`),
    /// `router(&state)` picks a key that's looked up in `path_map` to find the
    /// next node id (or [`END`]).
    pub fn add_conditional_edges(
        &mut self,
        from: impl Into<String>,
        router: ConditionalRouterFn<S>,
        path_map: HashMap<String, String>,
    ) -> &mut Self {
        self.edges.insert(from.into(), Edge::Conditional { router, path_map });
        self
    }

    pub fn with_middleware(&mut self, middleware: Arc<dyn NodeMiddleware<S>>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    pub fn with_recursion_limit(&mut self, limit: usize) -> &mut Self {
        self.recursion_limit = limit;
        self
    }

    /// Validates and compiles the graph.
    ///
    /// Checks: exactly one edge from [`START`]; every referenced node exists;
    /// at least one path reaches [`END`]; every path_map target is a known
    /// node or `END`; every node is reachable from the start node.
    pub fn compile(&mut self) -> Result<CompiledStateGraph<S>, CompilationError> {
        let start_edge = self.edges.get(START).ok_or(CompilationError::MissingStart)?;
        let first_node_id = match start_edge {
            Edge::Direct(id) => id.clone(),
            Edge::Conditional { .. } => {
                return Err(CompilationError::InvalidChain(
                    "START must have a direct edge, not a conditional one".into(),
                ))
            }
        };
        self.check_node_exists(&first_node_id)?;

        let mut next_map = HashMap::new();
        let mut reaches_end = false;

        for (from, edge) in &self.edges {
            if from == START {
                continue;
            }
            self.check_node_exists(from)?;
            match edge {
                Edge::Direct(to) => {
                    if to == END {
                        reaches_end = true;
                    } else {
                        self.check_node_exists(to)?;
                    }
                    next_map.insert(from.clone(), NextEntry::Fixed(to.clone()));
                }
                Edge::Conditional { router, path_map } => {
                    for target in path_map.values() {
                        if target == END {
                            reaches_end = true;
                        } else if !self.nodes.contains_key(target) {
                            return Err(CompilationError::InvalidConditionalPathMap(target.clone()));
                        }
                    }
                    next_map.insert(
                        from.clone(),
                        NextEntry::Conditional {
                            router: router.clone(),
                            path_map: path_map.clone(),
                        },
                    );
                }
            }
        }

        if !reaches_end {
            return Err(CompilationError::MissingEnd);
        }

        let reachable = self.reachable_node_ids(&first_node_id, &next_map);
        let unreferenced: Vec<_> = self
            .nodes
            .keys()
            .filter(|id| !reachable.contains(id.as_str()))
            .cloned()
            .collect();
        if !unreferenced.is_empty() {
            return Err(CompilationError::InvalidChain(format!(
                "unreachable nodes: {}",
                unreferenced.join(", ")
            )));
        }

        Ok(CompiledStateGraph {
            nodes: std::mem::take(&mut self.nodes),
            first_node_id,
            next_map,
            middleware: self.middleware.clone(),
            recursion_limit: self.recursion_limit,
        })
    }

    fn check_node_exists(&self, id: &str) -> Result<(), CompilationError> {
        if self.nodes.contains_key(id) {
            Ok(())
        } else {
            Err(CompilationError::NodeNotFound(id.to_string()))
        }
    }

    fn reachable_node_ids(&self, first: &str, next_map: &HashMap<String, NextEntry<S>>) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut stack = vec![first.to_string()];
        while let Some(id) = stack.pop() {
            if id == END || !seen.insert(id.clone()) {
                continue;
            }
            match next_map.get(&id) {
                Some(NextEntry::Fixed(to)) => stack.push(to.clone()),
                Some(NextEntry::Conditional { path_map, .. }) => stack.extend(path_map.values().cloned()),
                None => {}
            }
        }
        seen
    }
}
