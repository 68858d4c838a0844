//! Graph state for the think/act/observe loop.
//!
//! [`ThreadState`] is the `S` that flows through [`crate::graph::StateGraph`]. It
//! is `Serialize`/`Deserialize` so [`crate::runner::run_turn`] can hand it
//! straight to a [`crate::memory::Checkpointer`] as an opaque payload between
//! turns — there is no separate checkpoint record type.

use crate::llm::LlmUsage;
use crate::message::Message;

/// A single tool invocation requested by the model.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Result of executing one [`ToolCall`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub output: String,
    pub is_error: bool,
}

/// Conversation state threaded through think → act → observe.
///
/// `tool_calls` holds the current round's pending calls (cleared once Act
/// consumes them); `tool_results` holds Act's outputs for the Observe node to
/// fold back into `messages`. `turn_count` bounds the think/act loop per spec
/// §8's recursion invariant; `messages_compacted_through` is the index up to
/// which the compression subgraph has already summarized, so prune/compact
/// don't reprocess history on every turn.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ThreadState {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub tool_results: Vec<ToolResult>,
    #[serde(default)]
    pub turn_count: usize,
    #[serde(default)]
    pub messages_compacted_through: usize,
    #[serde(default)]
    pub usage: Option<LlmUsage>,
    #[serde(default)]
    pub total_usage: LlmUsage,
}

impl ThreadState {
    /// The last assistant message's text, or empty string if none.
    pub fn last_assistant_reply(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find_map(|m| match m {
                Message::Assistant { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_assistant_reply_finds_most_recent() {
        let mut s = ThreadState::default();
        s.messages.push(Message::user("hi"));
        s.messages.push(Message::assistant("first"));
        s.messages.push(Message::user("again"));
        s.messages.push(Message::assistant("second"));
        assert_eq!(s.last_assistant_reply(), "second");
    }

    #[test]
    fn last_assistant_reply_empty_when_none() {
        let s = ThreadState::default();
        assert_eq!(s.last_assistant_reply(), "");
    }

    #[test]
    fn thread_state_roundtrips_through_json() {
        let mut s = ThreadState::default();
        s.messages.push(Message::user("hi"));
        s.turn_count = 2;
        let bytes = serde_json::to_vec(&s).unwrap();
        let back: ThreadState = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.turn_count, 2);
        assert_eq!(back.messages.len(), 1);
    }
}
