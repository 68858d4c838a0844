//! A scripted [`LlmClient`] for tests: returns a fixed response, or the next
//! of a queue of responses if configured with several.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmClient, LlmResponse, LlmUsage};
use crate::error::AgentError;
use crate::message::Message;
use crate::tool_source::ToolSpec;

/// Replays a fixed sequence of [`LlmResponse`]s, one per call; the last one
/// repeats once the queue is exhausted so a test doesn't need to size it
/// exactly to the number of think rounds.
pub struct MockLlm {
    responses: Mutex<Vec<LlmResponse>>,
}

impl MockLlm {
    /// A mock that always returns a plain assistant message with no tool calls.
    pub fn fixed_text(content: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(vec![LlmResponse {
                content: content.into(),
                tool_calls: vec![],
                usage: Some(LlmUsage {
                    prompt_tokens: 0,
                    completion_tokens: 0,
                    total_tokens: 0,
                }),
            }]),
        }
    }

    /// A mock that replays `responses` in order, repeating the last entry
    /// once exhausted.
    pub fn scripted(responses: Vec<LlmResponse>) -> Self {
        assert!(!responses.is_empty(), "scripted mock needs at least one response");
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, _messages: &[Message], _tools: &[ToolSpec]) -> Result<LlmResponse, AgentError> {
        let mut responses = self.responses.lock().expect("mock lock poisoned");
        let next = if responses.len() > 1 {
            responses.remove(0)
        } else {
            LlmResponse {
                content: responses[0].content.clone(),
                tool_calls: responses[0].tool_calls.clone(),
                usage: responses[0].usage.clone(),
            }
        };
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ToolCall;

    #[tokio::test]
    async fn fixed_text_always_returns_same_content() {
        let llm = MockLlm::fixed_text("hi there");
        let r1 = llm.invoke(&[], &[]).await.unwrap();
        let r2 = llm.invoke(&[], &[]).await.unwrap();
        assert_eq!(r1.content, "hi there");
        assert_eq!(r2.content, "hi there");
    }

    #[tokio::test]
    async fn scripted_replays_in_order_then_repeats_last() {
        let llm = MockLlm::scripted(vec![
            LlmResponse {
                content: "first".into(),
                tool_calls: vec![ToolCall {
                    call_id: "c1".into(),
                    name: "bash".into(),
                    arguments: serde_json::json!({}),
                }],
                usage: None,
            },
            LlmResponse {
                content: "second".into(),
                tool_calls: vec![],
                usage: None,
            },
        ]);
        let r1 = llm.invoke(&[], &[]).await.unwrap();
        assert_eq!(r1.content, "first");
        assert_eq!(r1.tool_calls.len(), 1);
        let r2 = llm.invoke(&[], &[]).await.unwrap();
        assert_eq!(r2.content, "second");
        let r3 = llm.invoke(&[], &[]).await.unwrap();
        assert_eq!(r3.content, "second");
    }
}
