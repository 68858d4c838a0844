//! # agent-core
//!
//! The Agent Execution Core: a graph engine, checkpointing, an LLM client
//! abstraction, a tool set, and the Agent Factory that compiles and caches
//! think/act/observe graphs per tenant credentials.
//!
//! ## Design principles
//!
//! - **Single state type**: one [`state::ThreadState`] flows through every
//!   node in a compiled graph; nodes read and return it, never a separate
//!   input/output pair.
//! - **State graphs**: [`graph::StateGraph`] composes nodes with static and
//!   conditional edges into an immutable [`graph::CompiledStateGraph`].
//! - **One compiled agent per tenant credential set**: [`factory::AgentFactory`]
//!   memoizes compiled graphs by [`factory::AgentKey`] (model, API key, base
//!   URL, output cap) so turns with the same credentials reuse one graph.
//!
//! ## Main modules
//!
//! - [`graph`]: [`graph::StateGraph`], [`graph::CompiledStateGraph`], [`graph::Node`],
//!   [`graph::NodeMiddleware`], [`graph::RunContext`] — build and run state graphs.
//! - [`agent::react`]: the think/act/observe nodes ([`agent::react::ThinkNode`],
//!   [`agent::react::ActNode`], [`agent::react::ObserveNode`]) and [`agent::react::tools_condition`].
//! - [`compress`]: the prune → compact compression subgraph folded into the
//!   outer loop between `observe` and `think`.
//! - [`factory`]: [`factory::AgentFactory`], [`factory::AgentKey`] — builds and
//!   caches compiled agents, sharing one tool set across all of them.
//! - [`session_config`]: resolves per-turn [`session_config::SessionConfig`]
//!   (model, credentials, recursion bound) from a [`session_config::UserSettingsProvider`]
//!   plus process-environment defaults.
//! - [`runner`]: [`runner::AgentRunner`] — the public turn entry point; loads
//!   checkpoints, runs the compiled agent, persists the result, streams events.
//! - [`llm`]: [`llm::LlmClient`] trait, [`llm::MockLlm`], [`llm::ChatOpenAI`].
//! - [`memory`]: checkpointing ([`memory::Checkpointer`], [`memory::MemorySaver`], [`memory::SqliteSaver`]).
//! - [`tool_source`]: [`tool_source::ToolSource`], [`tool_source::ToolSpec`], [`tool_source::ToolCallContext`].
//! - [`tools`]: in-process [`tools::Tool`] implementations ([`tools::AggregateToolSource`], the todo-list tools).
//! - [`message`]: [`message::Message`], [`message::MessageRecord`].
//! - [`stream`]: [`stream::StreamEvent`], [`stream::StreamSender`] — the turn event taxonomy.
//! - [`error`]: [`error::AgentError`], [`error::ErrorKind`].

pub mod agent;
pub mod compress;
pub mod error;
pub mod factory;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod runner;
pub mod session_config;
pub mod state;
pub mod stream;
pub mod tool_source;
pub mod tools;

pub use error::{AgentError, ErrorKind};
pub use factory::{AgentFactory, AgentKey, CompiledAgent};
pub use graph::{CompilationError, CompiledStateGraph, Next, Node, NodeMiddleware, RunContext, StateGraph, END, START};
pub use llm::{ChatOpenAI, LlmClient, LlmResponse, LlmUsage, MockLlm, ToolChoiceMode};
pub use memory::{CheckpointError, CheckpointRecord, Checkpointer, MemorySaver, SqliteSaver};
pub use message::{Message, MessageRecord};
pub use runner::AgentRunner;
pub use session_config::{
    EnvironmentDefaults, NoUserSettings, SessionConfig, SessionConfigResolver, UserSettings,
    UserSettingsProvider, MAX_RECURSION_BOUND,
};
pub use state::{ThreadState, ToolCall, ToolResult};
pub use stream::{StreamEvent, StreamSender, ToolEndStatus};
pub use tool_source::{ToolCallContent, ToolCallContext, ToolSource, ToolSourceError, ToolSpec};
pub use tools::{AggregateToolSource, Tool, ToolRegistry};
