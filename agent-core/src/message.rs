//! Conversation message types.
//!
//! [`Message`] is what flows through the graph state and what the LLM client
//! consumes. It doubles as the wire record returned in [`crate::stream::StreamEvent::Done`];
//! `id`/`created_at` are filled in when a message is appended to a thread rather
//! than when it's first produced by a node, so nodes can build messages with
//! [`Message::user`]/[`Message::assistant`] without worrying about bookkeeping.

use crate::state::ToolCall;

/// One message in a conversation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            call_id: call_id.into(),
            content: content.into(),
        }
    }

    /// Plain-text content, used for building LLM prompts and for display.
    pub fn content(&self) -> &str {
        match self {
            Message::System { content } => content,
            Message::User { content } => content,
            Message::Assistant { content, .. } => content,
            Message::Tool { content, .. } => content,
        }
    }
}

/// A durable record of a message once it has been appended to a thread.
///
/// Produced by the execution loop from a graph-internal [`Message`] when
/// building [`crate::stream::StreamEvent::Done`] and the checkpointed
/// [`crate::state::ThreadState`] history. Order within a thread is given by
/// `order_index`, not by wall-clock time (two messages can share a timestamp).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub order_index: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub message: Message,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_reads_through_variants() {
        assert_eq!(Message::user("hi").content(), "hi");
        assert_eq!(Message::assistant("hey").content(), "hey");
        assert_eq!(Message::tool("c1", "ok").content(), "ok");
    }

    #[test]
    fn assistant_serializes_with_role_tag() {
        let m = Message::assistant("hi");
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn message_record_roundtrips() {
        let rec = MessageRecord {
            id: "m1".into(),
            order_index: 0,
            created_at: chrono::Utc::now(),
            message: Message::user("hi"),
        };
        let json = serde_json::to_string(&rec).unwrap();
        let back: MessageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "m1");
        assert_eq!(back.message.content(), "hi");
    }
}
