//! The public streaming event taxonomy emitted by one turn.
//!
//! Replaces the teacher's generic multi-mode `StreamEvent<S>`/`StreamWriter<S>`
//! machinery with a fixed, non-generic event set: callers of
//! [`crate::runner::run_turn`] see exactly these variants over the wire (SSE in
//! `serve`, or any other transport), never the internal graph state type.

use crate::error::ErrorKind;
use crate::message::MessageRecord;

/// One event in a turn's stream.
///
/// Order within a turn: `MessageStart`, any number of `Content`/`ToolStart`/
/// `ToolInput`/`ToolEnd` (interleaved across think/act rounds), then exactly one
/// of `MessageEnd` → `Done`, `Stopped`, or `Error`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// The assistant has begun producing a new turn.
    MessageStart,
    /// An incremental chunk of assistant text from node `node`.
    Content { node: String, delta: String },
    /// A tool call has been dispatched.
    ToolStart {
        tool_call_id: String,
        tool_name: String,
    },
    /// Incremental JSON-encoded tool input arguments (as the model streams them).
    ToolInput {
        tool_call_id: String,
        input_json: String,
    },
    /// A tool call has finished.
    ToolEnd {
        tool_call_id: String,
        output_value: serde_json::Value,
        status: ToolEndStatus,
    },
    /// The assistant has finished producing this turn's message.
    MessageEnd,
    /// The turn completed normally; carries the full updated message history.
    Done { messages: Vec<MessageRecord> },
    /// The turn was cancelled by the caller before completion.
    Stopped,
    /// The turn failed.
    Error { kind: ErrorKind, detail: String },
}

/// Outcome of a single tool call, carried on [`StreamEvent::ToolEnd`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolEndStatus {
    Ok,
    Error,
}

/// Sending half of a turn's event stream.
///
/// Cloneable; nodes hold a clone and emit as they make progress. Send errors
/// (receiver dropped, i.e. the caller disconnected) are swallowed — the node
/// keeps running so state stays consistent for checkpointing, it just has no
/// one listening anymore.
#[derive(Clone)]
pub struct StreamSender {
    tx: tokio::sync::mpsc::UnboundedSender<StreamEvent>,
}

impl StreamSender {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { tx }
    }

    /// Emits an event, ignoring a disconnected receiver.
    pub fn emit(&self, event: StreamEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_tag_serializes_as_type_field() {
        let e = StreamEvent::Content {
            node: "think".into(),
            delta: "hi".into(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "content");
        assert_eq!(json["node"], "think");
    }

    #[test]
    fn stream_sender_emit_after_drop_does_not_panic() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let sender = StreamSender::new(tx);
        drop(rx);
        sender.emit(StreamEvent::MessageStart);
    }
}
