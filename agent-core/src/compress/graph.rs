//! Builds the compression subgraph (prune → compact → END) and a node
//! wrapper to embed it in a parent graph (observe → compress → think).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, Next, Node, RunContext, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::state::ThreadState;

use super::compact_node::CompactNode;
use super::config::CompactionConfig;
use super::prune_node::PruneNode;

/// Builds the compression subgraph: prune → compact → END.
pub fn build_graph(
    config: CompactionConfig,
    llm: Arc<dyn LlmClient>,
) -> Result<CompiledStateGraph<ThreadState>, CompilationError> {
    let prune_node = Arc::new(PruneNode {
        config: config.clone(),
    });
    let compact_node = Arc::new(CompactNode { config, llm });
    let mut graph = StateGraph::<ThreadState>::new();
    graph
        .add_node("prune", prune_node)
        .add_node("compact", compact_node)
        .add_edge(START, "prune")
        .add_edge("prune", "compact")
        .add_edge("compact", END);
    graph.compile()
}

/// Wraps a compiled compression graph so it can be used as a node.
pub struct CompressionGraphNode {
    inner: CompiledStateGraph<ThreadState>,
}

impl CompressionGraphNode {
    pub fn new(inner: CompiledStateGraph<ThreadState>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Node<ThreadState> for CompressionGraphNode {
    fn id(&self) -> &str {
        "compress"
    }

    async fn run(&self, state: ThreadState) -> Result<(ThreadState, Next), AgentError> {
        let new_state = self.inner.invoke(state).await?;
        Ok((new_state, Next::Continue))
    }

    async fn run_with_context(
        &self,
        state: ThreadState,
        ctx: &RunContext<ThreadState>,
    ) -> Result<(ThreadState, Next), AgentError> {
        let mut inner_ctx = RunContext::new(ctx.thread_id.clone(), ctx.user_id.clone()).with_cancel(ctx.cancel.clone());
        if let Some(stream) = &ctx.stream {
            inner_ctx = inner_ctx.with_stream(stream.clone());
        }
        let new_state = self.inner.invoke_with_context(state, Arc::new(inner_ctx)).await?;
        Ok((new_state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::llm::MockLlm;
    use crate::message::Message;
    use crate::state::ThreadState;

    use super::*;

    #[test]
    fn build_graph_compiles() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::fixed_text(""));
        let _compiled = build_graph(CompactionConfig::default(), llm).expect("compile");
    }

    #[tokio::test]
    async fn build_graph_invoke_preserves_messages_when_no_prune_no_overflow() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::fixed_text(""));
        let compiled = build_graph(CompactionConfig::default(), llm).expect("compile");
        let mut state = ThreadState::default();
        state.messages.push(Message::user("hello"));
        let out = compiled.invoke(state).await.unwrap();
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].content(), "hello");
    }

    #[tokio::test]
    async fn compression_graph_node_id_is_compress() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::fixed_text(""));
        let inner = build_graph(CompactionConfig::default(), llm).unwrap();
        let node = CompressionGraphNode::new(inner);
        assert_eq!(node.id(), "compress");
    }

    #[tokio::test]
    async fn compression_graph_node_run_invokes_inner() {
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlm::fixed_text(""));
        let inner = build_graph(CompactionConfig::default(), llm).unwrap();
        let node = CompressionGraphNode::new(inner);
        let mut state = ThreadState::default();
        state.messages.push(Message::user("test"));
        state.turn_count = 1;
        let (out, next) = node.run(state).await.unwrap();
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.turn_count, 1);
        assert!(matches!(next, Next::Continue));
    }
}
