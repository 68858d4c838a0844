//! Act node: executes the current round's tool calls via a [`ToolSource`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::state::{ThreadState, ToolResult};
use crate::stream::{StreamEvent, ToolEndStatus};
use crate::tool_source::{ToolCallContext, ToolSource};

pub struct ActNode {
    tool_source: Arc<dyn ToolSource>,
}

impl ActNode {
    pub fn new(tool_source: Arc<dyn ToolSource>) -> Self {
        Self { tool_source }
    }

    async fn run_calls(
        &self,
        state: &ThreadState,
        stream: Option<&crate::stream::StreamSender>,
        ids: Option<(&str, &str)>,
    ) -> Vec<ToolResult> {
        let ctx = ToolCallContext::new(state.messages.clone())
            .with_ids(ids.map(|(t, _)| t.to_string()), ids.map(|(_, u)| u.to_string()));
        let mut results = Vec::with_capacity(state.tool_calls.len());
        for call in &state.tool_calls {
            if let Some(stream) = stream {
                stream.emit(StreamEvent::ToolStart {
                    tool_call_id: call.call_id.clone(),
                    tool_name: call.name.clone(),
                });
            }
            let outcome = self
                .tool_source
                .call_tool_with_context(&call.name, call.arguments.clone(), Some(&ctx))
                .await;
            let (output, is_error) = match &outcome {
                Ok(content) => (content.text.clone(), false),
                Err(e) => (e.to_string(), true),
            };
            if let Some(stream) = stream {
                stream.emit(StreamEvent::ToolEnd {
                    tool_call_id: call.call_id.clone(),
                    output_value: serde_json::Value::String(output.clone()),
                    status: if is_error { ToolEndStatus::Error } else { ToolEndStatus::Ok },
                });
            }
            results.push(ToolResult {
                call_id: call.call_id.clone(),
                output,
                is_error,
            });
        }
        results
    }
}

#[async_trait]
impl Node<ThreadState> for ActNode {
    fn id(&self) -> &str {
        "act"
    }

    async fn run(&self, mut state: ThreadState) -> Result<(ThreadState, Next), AgentError> {
        let results = self.run_calls(&state, None, None).await;
        state.tool_results = results;
        Ok((state, Next::Continue))
    }

    async fn run_with_context(
        &self,
        mut state: ThreadState,
        ctx: &RunContext<ThreadState>,
    ) -> Result<(ThreadState, Next), AgentError> {
        let results = self
            .run_calls(&state, ctx.stream.as_ref(), Some((&ctx.thread_id, &ctx.user_id)))
            .await;
        state.tool_results = results;
        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::state::ToolCall;
    use crate::tool_source::{ToolCallContent, ToolSourceError, ToolSpec};

    struct EchoSource;

    #[async_trait]
    impl ToolSource for EchoSource {
        async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolSourceError> {
            Ok(vec![])
        }

        async fn call_tool(
            &self,
            name: &str,
            arguments: serde_json::Value,
        ) -> Result<ToolCallContent, ToolSourceError> {
            if name == "boom" {
                return Err(ToolSourceError::Execution("kaboom".into()));
            }
            Ok(ToolCallContent::text(arguments.to_string()))
        }
    }

    #[tokio::test]
    async fn act_runs_pending_tool_calls() {
        let node = ActNode::new(Arc::new(EchoSource));
        let mut state = ThreadState::default();
        state.messages.push(Message::user("hi"));
        state.tool_calls.push(ToolCall {
            call_id: "c1".into(),
            name: "echo".into(),
            arguments: serde_json::json!({"x": 1}),
        });
        let (out, next) = node.run(state).await.unwrap();
        assert_eq!(out.tool_results.len(), 1);
        assert!(!out.tool_results[0].is_error);
        assert!(matches!(next, Next::Continue));
    }

    #[tokio::test]
    async fn act_records_tool_errors_without_failing_the_node() {
        let node = ActNode::new(Arc::new(EchoSource));
        let mut state = ThreadState::default();
        state.tool_calls.push(ToolCall {
            call_id: "c1".into(),
            name: "boom".into(),
            arguments: serde_json::json!({}),
        });
        let (out, _) = node.run(state).await.unwrap();
        assert!(out.tool_results[0].is_error);
        assert!(out.tool_results[0].output.contains("kaboom"));
    }
}
