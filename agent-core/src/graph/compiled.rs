//! Compiled, immutable, executable graph.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::AgentError;

use super::conditional::NextEntry;
use super::node_middleware::NodeMiddleware;
use super::run_context::RunContext;
use super::state_graph::END;
use super::{Next, Node};

type BoxFut<S> = Pin<Box<dyn Future<Output = Result<(S, Next), AgentError>> + Send>>;

const DEFAULT_RECURSION_LIMIT: usize = 50;

/// A validated, runnable graph produced by [`crate::graph::StateGraph::compile`].
pub struct CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) middleware: Vec<Arc<dyn NodeMiddleware<S>>>,
    pub(super) recursion_limit: usize,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Runs the graph to completion with no run context (no streaming, no cancellation).
    pub async fn invoke(&self, state: S) -> Result<S, AgentError> {
        self.run(state, None).await
    }

    /// Runs the graph to completion, passing `ctx` to every node's `run_with_context`.
    pub async fn invoke_with_context(&self, state: S, ctx: Arc<RunContext<S>>) -> Result<S, AgentError> {
        self.run(state, Some(ctx)).await
    }

    async fn run(&self, mut state: S, ctx: Option<Arc<RunContext<S>>>) -> Result<S, AgentError> {
        let mut current = self.first_node_id.clone();
        for _ in 0..self.recursion_limit {
            if let Some(ctx) = &ctx {
                if ctx.is_cancelled() {
                    return Err(AgentError::Cancelled);
                }
            }

            let node = self
                .nodes
                .get(&current)
                .cloned()
                .ok_or_else(|| AgentError::Internal(format!("node not found at runtime: {current}")))?;

            let (next_state, next) = self.run_node(&current, node, state, ctx.clone()).await?;
            state = next_state;

            current = match next {
                Next::End => return Ok(state),
                Next::Node(id) => id,
                Next::Continue => match self.next_map.get(&current) {
                    Some(NextEntry::Fixed(id)) => id.clone(),
                    Some(NextEntry::Conditional { router, path_map }) => {
                        let key = router(&state);
                        path_map
                            .get(&key)
                            .cloned()
                            .ok_or_else(|| AgentError::Internal(format!("no path for routing key: {key}")))?
                    }
                    None => {
                        return Err(AgentError::Internal(format!("node {current} has no outgoing edge")))
                    }
                },
            };

            if current == END {
                return Ok(state);
            }
        }
        Err(AgentError::RecursionLimit(self.recursion_limit))
    }

    async fn run_node(
        &self,
        node_id: &str,
        node: Arc<dyn Node<S>>,
        state: S,
        ctx: Option<Arc<RunContext<S>>>,
    ) -> Result<(S, Next), AgentError> {
        let base: Box<dyn FnOnce(S) -> BoxFut<S> + Send> = match ctx {
            Some(ctx) => {
                let node = node.clone();
                Box::new(move |state: S| -> BoxFut<S> {
                    Box::pin(async move { node.run_with_context(state, &ctx).await })
                })
            }
            None => Box::new(move |state: S| -> BoxFut<S> { Box::pin(async move { node.run(state).await }) }),
        };

        let mut chain = base;
        for mw in self.middleware.iter().rev() {
            let mw = mw.clone();
            let node_id_owned = node_id.to_string();
            let previous = chain;
            chain = Box::new(move |state: S| -> BoxFut<S> {
                Box::pin(async move { mw.around_run(&node_id_owned, state, previous).await })
            });
        }

        chain(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CompilationError, StateGraph, START};
    use async_trait::async_trait;

    #[derive(Clone, Debug, Default)]
    struct Counter(i32);

    struct Inc(&'static str);

    #[async_trait]
    impl Node<Counter> for Inc {
        fn id(&self) -> &str {
            self.0
        }
        async fn run(&self, mut state: Counter) -> Result<(Counter, Next), AgentError> {
            state.0 += 1;
            Ok((state, Next::Continue))
        }
    }

    #[tokio::test]
    async fn linear_graph_runs_all_nodes_in_order() -> Result<(), CompilationError> {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("a", Arc::new(Inc("a")))
            .add_node("b", Arc::new(Inc("b")))
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", crate::graph::END);
        let compiled = graph.compile()?;
        let out = compiled.invoke(Counter::default()).await.unwrap();
        assert_eq!(out.0, 2);
        Ok(())
    }

    struct Loop;

    #[async_trait]
    impl Node<Counter> for Loop {
        fn id(&self) -> &str {
            "loop"
        }
        async fn run(&self, mut state: Counter) -> Result<(Counter, Next), AgentError> {
            state.0 += 1;
            Ok((state, Next::Node("loop".to_string())))
        }
    }

    #[tokio::test]
    async fn recursion_limit_is_enforced() -> Result<(), CompilationError> {
        let mut graph = StateGraph::<Counter>::new();
        graph
            .add_node("loop", Arc::new(Loop))
            .add_edge(START, "loop")
            .add_edge("loop", crate::graph::END);
        let compiled = graph.compile()?;
        let err = compiled.invoke(Counter::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::RecursionLimit(_)));
        Ok(())
    }
}
