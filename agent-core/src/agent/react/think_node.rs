//! Think node: read messages, call the LLM, append its reply and any tool calls.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::llm::{LlmClient, LlmUsage};
use crate::message::Message;
use crate::state::ThreadState;
use crate::stream::StreamEvent;
use crate::tool_source::ToolSource;

pub struct ThinkNode {
    llm: Arc<dyn LlmClient>,
    tool_source: Arc<dyn ToolSource>,
}

impl ThinkNode {
    pub fn new(llm: Arc<dyn LlmClient>, tool_source: Arc<dyn ToolSource>) -> Self {
        Self { llm, tool_source }
    }
}

fn accumulate_usage(total: &LlmUsage, latest: &LlmUsage) -> LlmUsage {
    LlmUsage {
        prompt_tokens: total.prompt_tokens + latest.prompt_tokens,
        completion_tokens: total.completion_tokens + latest.completion_tokens,
        total_tokens: total.total_tokens + latest.total_tokens,
    }
}

#[async_trait]
impl Node<ThreadState> for ThinkNode {
    fn id(&self) -> &str {
        "think"
    }

    async fn run(&self, state: ThreadState) -> Result<(ThreadState, Next), AgentError> {
        let tools = self.tool_source.list_tools().await?;
        let response = self.llm.invoke(&state.messages, &tools).await?;
        apply_response(state, response)
    }

    async fn run_with_context(
        &self,
        state: ThreadState,
        ctx: &RunContext<ThreadState>,
    ) -> Result<(ThreadState, Next), AgentError> {
        if let Some(bound) = ctx.recursion_bound {
            if state.turn_count >= bound {
                return Err(AgentError::RecursionLimit(bound));
            }
        }
        if let Some(stream) = &ctx.stream {
            stream.emit(StreamEvent::MessageStart);
        }
        let tools = self.tool_source.list_tools().await?;
        let response = self.llm.invoke(&state.messages, &tools).await?;
        if let Some(stream) = &ctx.stream {
            if !response.content.is_empty() {
                stream.emit(StreamEvent::Content {
                    node: self.id().to_string(),
                    delta: response.content.clone(),
                });
            }
            stream.emit(StreamEvent::MessageEnd);
        }
        apply_response(state, response)
    }
}

fn apply_response(
    mut state: ThreadState,
    response: crate::llm::LlmResponse,
) -> Result<(ThreadState, Next), AgentError> {
    state.usage = response.usage.clone();
    if let Some(usage) = &response.usage {
        state.total_usage = accumulate_usage(&state.total_usage, usage);
    }
    state.tool_calls = response.tool_calls.clone();
    state.messages.push(Message::assistant_with_tool_calls(
        response.content,
        response.tool_calls,
    ));
    state.turn_count += 1;
    Ok((state, Next::Continue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::tools::AggregateToolSource;

    fn empty_tool_source() -> Arc<dyn ToolSource> {
        Arc::new(AggregateToolSource::new())
    }

    #[tokio::test]
    async fn think_appends_assistant_message() {
        let node = ThinkNode::new(Arc::new(MockLlm::fixed_text("hello there")), empty_tool_source());
        let mut state = ThreadState::default();
        state.messages.push(Message::user("hi"));
        let (out, next) = node.run(state).await.unwrap();
        assert_eq!(out.last_assistant_reply(), "hello there");
        assert_eq!(out.turn_count, 1);
        assert!(matches!(next, Next::Continue));
    }

    #[tokio::test]
    async fn think_respects_per_turn_recursion_bound() {
        let node = ThinkNode::new(Arc::new(MockLlm::fixed_text("hi")), empty_tool_source());
        let mut state = ThreadState::default();
        state.messages.push(Message::user("hi"));
        state.turn_count = 3;
        let ctx = RunContext::new("t1", "u1").with_recursion_bound(3);
        let err = node.run_with_context(state, &ctx).await.unwrap_err();
        assert!(matches!(err, AgentError::RecursionLimit(3)));
    }

    #[tokio::test]
    async fn think_tracks_total_usage_across_calls() {
        let node = ThinkNode::new(Arc::new(MockLlm::fixed_text("hi")), empty_tool_source());
        let mut state = ThreadState::default();
        state.messages.push(Message::user("hi"));
        let (state, _) = node.run(state).await.unwrap();
        let (state, _) = node.run(state).await.unwrap();
        assert_eq!(state.total_usage.total_tokens, 0);
    }
}
