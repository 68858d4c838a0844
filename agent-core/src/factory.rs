//! Agent Factory: memoized construction of compiled agent graphs.
//!
//! One compiled agent is built per [`AgentKey`] (model, credentials, output
//! cap) and cached; all cached agents share the same tool set (built once at
//! [`AgentFactory`] construction). Eviction drops only the compiled graph —
//! the checkpoint store and tool set outlive any individual agent.
//!
//! The compiled graph is `think → act → observe → compress → think`, with a
//! conditional edge out of `think` to `act` when tool calls are present or to
//! `END` otherwise, directly mirroring [`crate::agent::react`]'s node wiring.
//! `compress` folds into the loop on every iteration rather than only on
//! overflow, since [`crate::compress::CompressionGraphNode`] already no-ops
//! cheaply under threshold.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::agent::react::{tools_condition, ActNode, ObserveNode, ThinkNode};
use crate::compress::{self, CompactionConfig, CompressionGraphNode};
use crate::error::AgentError;
use crate::graph::{CompilationError, ConditionalRouter, Next, NodeMiddleware, StateGraph, END, START};
use crate::llm::{ChatOpenAI, LlmClient};
use crate::state::ThreadState;
use crate::tools::{AggregateToolSource, Tool, TodoReadTool, TodoWriteTool};

/// Default bound on the number of cached compiled agents.
pub const DEFAULT_AGENT_CACHE_CAPACITY: usize = 32;

/// Memoization key for the Agent Factory: determines which compiled agent
/// instance serves a turn. Instances are shared across users when keys
/// collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentKey {
    pub llm_model: String,
    pub api_key: String,
    pub base_url: String,
    pub max_output_tokens: Option<u32>,
}

impl From<&crate::session_config::SessionConfig> for AgentKey {
    fn from(cfg: &crate::session_config::SessionConfig) -> Self {
        Self {
            llm_model: cfg.llm_model.clone(),
            api_key: cfg.api_key.clone(),
            base_url: cfg.base_url.clone(),
            max_output_tokens: cfg.max_output_tokens,
        }
    }
}

/// A compiled, runnable agent graph bound to one [`AgentKey`]'s credentials.
pub struct CompiledAgent {
    pub(crate) graph: crate::graph::CompiledStateGraph<ThreadState>,
}

impl CompiledAgent {
    pub fn graph(&self) -> &crate::graph::CompiledStateGraph<ThreadState> {
        &self.graph
    }
}

/// Normalizes malformed tool-call payloads from the LLM after `think` runs:
/// drops calls with an empty name (the model emitted a call with no target),
/// and defaults non-object arguments to `{}` so downstream tools always see
/// a JSON object.
struct ToolCallRepairMiddleware;

#[async_trait]
impl NodeMiddleware<ThreadState> for ToolCallRepairMiddleware {
    async fn around_run(
        &self,
        node_id: &str,
        state: ThreadState,
        inner: Box<
            dyn FnOnce(
                    ThreadState,
                )
                    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(ThreadState, Next), AgentError>> + Send>>
                + Send,
        >,
    ) -> Result<(ThreadState, Next), AgentError> {
        let (mut state, next) = inner(state).await?;
        if node_id == "think" {
            for call in state.tool_calls.iter_mut() {
                if !call.arguments.is_object() {
                    call.arguments = serde_json::json!({});
                }
            }
            state.tool_calls.retain(|call| !call.name.trim().is_empty());
        }
        Ok((state, next))
    }
}

/// Builds and caches compiled agents. Holds the single shared tool set
/// (todo-list tools plus whatever the caller provisions, e.g. the `sandbox`
/// crate's shell/file tools) that every cached agent uses.
pub struct AgentFactory {
    tool_source: Arc<AggregateToolSource>,
    capacity: usize,
    cache: DashMap<AgentKey, Arc<CompiledAgent>>,
    lru: Mutex<VecDeque<AgentKey>>,
}

impl AgentFactory {
    /// Builds a factory with the default cache capacity (≈32), registering
    /// `extra_tools` (e.g. sandbox-backed `shell_exec`/`write_file`/`read_file`)
    /// alongside the built-in todo-list tools.
    pub async fn new(extra_tools: Vec<Box<dyn Tool>>) -> Self {
        Self::with_capacity(extra_tools, DEFAULT_AGENT_CACHE_CAPACITY).await
    }

    pub async fn with_capacity(extra_tools: Vec<Box<dyn Tool>>, capacity: usize) -> Self {
        let source = AggregateToolSource::new();
        source.register_async(Box::new(TodoReadTool)).await;
        source.register_async(Box::new(TodoWriteTool)).await;
        for tool in extra_tools {
            source.register_async(tool).await;
        }
        Self {
            tool_source: Arc::new(source),
            capacity,
            cache: DashMap::new(),
            lru: Mutex::new(VecDeque::new()),
        }
    }

    /// The shared tool source every compiled agent uses. Exposed so a caller
    /// can set per-call context (`set_call_context`) before a turn.
    pub fn tool_source(&self) -> Arc<AggregateToolSource> {
        self.tool_source.clone()
    }

    /// Returns the cached agent for `key`, building and inserting it first if
    /// absent.
    pub fn get_or_build(&self, key: AgentKey) -> Result<Arc<CompiledAgent>, CompilationError> {
        if let Some(agent) = self.cache.get(&key) {
            self.touch(&key);
            return Ok(agent.clone());
        }
        let agent = Arc::new(self.build(&key)?);
        self.insert(key, agent.clone());
        Ok(agent)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn build(&self, key: &AgentKey) -> Result<CompiledAgent, CompilationError> {
        let llm: Arc<dyn LlmClient> = Arc::new(ChatOpenAI::with_credentials(
            key.llm_model.clone(),
            key.api_key.clone(),
            key.base_url.clone(),
            key.max_output_tokens,
        ));

        let think = Arc::new(ThinkNode::new(llm.clone(), self.tool_source.clone()));
        let act = Arc::new(ActNode::new(self.tool_source.clone()));
        let observe = Arc::new(ObserveNode);
        let compressed = compress::build_graph(CompactionConfig::default(), llm.clone())?;
        let compress_node = Arc::new(CompressionGraphNode::new(compressed));

        let route = ConditionalRouter::path_map([("tools", "act"), (END, END)]);

        let mut graph = StateGraph::<ThreadState>::new();
        graph
            .add_node("think", think)
            .add_node("act", act)
            .add_node("observe", observe)
            .add_node("compress", compress_node)
            .add_edge(START, "think")
            .add_conditional_edges(
                "think",
                Arc::new(|state: &ThreadState| tools_condition(state).as_str().to_string()),
                route,
            )
            .add_edge("act", "observe")
            .add_edge("observe", "compress")
            .add_edge("compress", "think")
            .with_middleware(Arc::new(ToolCallRepairMiddleware))
            .with_recursion_limit(crate::session_config::MAX_RECURSION_BOUND);

        Ok(CompiledAgent {
            graph: graph.compile()?,
        })
    }

    fn insert(&self, key: AgentKey, agent: Arc<CompiledAgent>) {
        self.cache.insert(key.clone(), agent);
        let mut lru = self.lru.lock().expect("agent factory lru lock poisoned");
        lru.push_back(key);
        while lru.len() > self.capacity {
            if let Some(evicted) = lru.pop_front() {
                self.cache.remove(&evicted);
            }
        }
    }

    fn touch(&self, key: &AgentKey) {
        let mut lru = self.lru.lock().expect("agent factory lru lock poisoned");
        if let Some(pos) = lru.iter().position(|k| k == key) {
            let key = lru.remove(pos).expect("position just found");
            lru.push_back(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn key(model: &str) -> AgentKey {
        AgentKey {
            llm_model: model.to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://example.invalid/v1".to_string(),
            max_output_tokens: None,
        }
    }

    #[tokio::test]
    async fn get_or_build_compiles_and_caches() {
        let factory = AgentFactory::new(vec![]).await;
        let agent1 = factory.get_or_build(key("model-a")).unwrap();
        let agent2 = factory.get_or_build(key("model-a")).unwrap();
        assert!(Arc::ptr_eq(&agent1, &agent2));
        assert_eq!(factory.len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_build_distinct_agents() {
        let factory = AgentFactory::new(vec![]).await;
        factory.get_or_build(key("model-a")).unwrap();
        factory.get_or_build(key("model-b")).unwrap();
        assert_eq!(factory.len(), 2);
    }

    #[tokio::test]
    async fn cache_evicts_least_recently_used_beyond_capacity() {
        let factory = AgentFactory::with_capacity(vec![], 2).await;
        factory.get_or_build(key("a")).unwrap();
        factory.get_or_build(key("b")).unwrap();
        factory.get_or_build(key("c")).unwrap();
        assert_eq!(factory.len(), 2);
        assert!(factory.cache.get(&key("a")).is_none());
        assert!(factory.cache.get(&key("b")).is_some());
        assert!(factory.cache.get(&key("c")).is_some());
    }

    #[tokio::test]
    async fn touching_an_entry_protects_it_from_eviction() {
        let factory = AgentFactory::with_capacity(vec![], 2).await;
        factory.get_or_build(key("a")).unwrap();
        factory.get_or_build(key("b")).unwrap();
        factory.get_or_build(key("a")).unwrap(); // touch a, b now LRU
        factory.get_or_build(key("c")).unwrap();
        assert!(factory.cache.get(&key("b")).is_none());
        assert!(factory.cache.get(&key("a")).is_some());
        assert!(factory.cache.get(&key("c")).is_some());
    }

    #[tokio::test]
    async fn tool_call_repair_middleware_defaults_non_object_arguments() {
        use crate::llm::{LlmResponse, MockLlm};
        use crate::state::ToolCall;

        let llm = MockLlm::scripted(vec![LlmResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                call_id: "c1".into(),
                name: "todo_read".into(),
                arguments: serde_json::Value::Null,
            }],
            usage: None,
        }]);
        let factory = AgentFactory::new(vec![]).await;
        let agent = factory.get_or_build(key("model-a")).unwrap();
        // Exercise think directly through the compiled graph's node map isn't
        // public; instead run think+middleware via a minimal graph of our own
        // wired the same way, using the scripted mock.
        let think = Arc::new(ThinkNode::new(Arc::new(llm), factory.tool_source()));
        let mut graph = StateGraph::<ThreadState>::new();
        graph
            .add_node("think", think)
            .add_edge(START, "think")
            .add_edge("think", END)
            .with_middleware(Arc::new(ToolCallRepairMiddleware));
        let compiled = graph.compile().unwrap();
        let mut state = ThreadState::default();
        state.messages.push(Message::user("hi"));
        let out = compiled.invoke(state).await.unwrap();
        assert_eq!(out.tool_calls.len(), 1);
        assert!(out.tool_calls[0].arguments.is_object());
        let _ = agent; // keep the factory-built agent alive for the cache assertions above
    }
}
