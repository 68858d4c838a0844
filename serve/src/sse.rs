//! Streaming Transport (C7): renders internal [`StreamEvent`]s as SSE frames
//! and wires client-disconnect into turn cancellation.

use std::pin::Pin;
use std::task::{Context, Poll};

use agent_core::{ErrorKind, StreamEvent};
use axum::response::sse::Event;
use futures_util::Stream;
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Sentinel frame marking the end of a turn's event stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Wire-stable error kind, distinct from `ErrorKind`'s internal 16-way
/// taxonomy: several internal kinds collapse onto the same bucket here,
/// since callers branch on a small set of recoverable classes, not on which
/// internal layer produced the failure.
pub fn wire_error_kind(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidThread => "thread-not-found",
        ErrorKind::ThreadBusy => "thread-busy",
        ErrorKind::LlmBackend => "llm-unavailable",
        ErrorKind::LlmTimeout | ErrorKind::ToolTimeout => "timeout",
        ErrorKind::UnknownTool | ErrorKind::ToolInvalidArgs | ErrorKind::ToolExecution => "tool-failed",
        ErrorKind::SandboxFault => "sandbox-unavailable",
        ErrorKind::CheckpointStorage => "storage-unavailable",
        ErrorKind::RecursionLimit => "recursion-exceeded",
        ErrorKind::Cancelled => "cancelled",
        ErrorKind::InvalidInput | ErrorKind::GraphCompilation | ErrorKind::NodeExecution | ErrorKind::Internal => {
            "internal"
        }
    }
}

/// Builds the JSON value for one [`StreamEvent`] frame, overriding the error
/// kind with its wire-stable string and optionally merging in an assigned
/// `thread_id`. Split out from [`to_sse_event`] so the framing logic is
/// testable without depending on `axum::response::sse::Event`'s internals.
fn build_frame_value(event: &StreamEvent, inject_thread_id: Option<&str>) -> serde_json::Value {
    let mut value = serde_json::to_value(event).unwrap_or_else(|e| {
        json!({ "type": "error", "kind": "internal", "detail": format!("event serialization failed: {e}") })
    });
    if let StreamEvent::Error { kind, .. } = event {
        if let Some(obj) = value.as_object_mut() {
            obj.insert("kind".to_string(), json!(wire_error_kind(*kind)));
        }
    }
    if let (Some(tid), Some(obj)) = (inject_thread_id, value.as_object_mut()) {
        obj.insert("thread_id".to_string(), json!(tid));
    }
    value
}

/// Renders one [`StreamEvent`] as an SSE `data: <json>` frame. `inject_thread_id`
/// merges `{"thread_id": ...}` into the frame when the server assigned the id
/// (only ever passed for the turn's first frame).
pub fn to_sse_event(event: &StreamEvent, inject_thread_id: Option<&str>) -> Event {
    Event::default().data(build_frame_value(event, inject_thread_id).to_string())
}

pin_project_lite::pin_project! {
    /// Wraps the turn's SSE byte stream with a cancel-on-drop guard. Axum
    /// drops a response body's stream on client disconnect or a write
    /// failure it can't recover from; that drop is the only reliable signal
    /// this layer gets for "the transport gave up", so it's what triggers
    /// the same cancellation the explicit cancel path uses.
    pub struct GuardedStream<S> {
        #[pin]
        inner: S,
        cancel: CancellationToken,
    }
}

impl<S> GuardedStream<S> {
    pub fn new(inner: S, cancel: CancellationToken) -> Self {
        Self { inner, cancel }
    }
}

impl<S> Drop for GuardedStream<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<S: Stream> Stream for GuardedStream<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::ToolEndStatus;

    #[test]
    fn content_event_serializes_with_type_tag() {
        let event = StreamEvent::Content {
            node: "think".to_string(),
            delta: "hi".to_string(),
        };
        let data = build_frame_value(&event, None);
        assert_eq!(data["type"], "content");
        assert_eq!(data["delta"], "hi");
    }

    #[test]
    fn error_event_carries_wire_stable_kind() {
        let event = StreamEvent::Error {
            kind: ErrorKind::SandboxFault,
            detail: "container unreachable".to_string(),
        };
        let data = build_frame_value(&event, None);
        assert_eq!(data["kind"], "sandbox-unavailable");
    }

    #[test]
    fn first_frame_carries_assigned_thread_id() {
        let event = StreamEvent::MessageStart;
        let data = build_frame_value(&event, Some("t-123"));
        assert_eq!(data["thread_id"], "t-123");
        assert_eq!(data["type"], "message_start");
    }

    #[test]
    fn tool_end_status_serializes_snake_case() {
        let event = StreamEvent::ToolEnd {
            tool_call_id: "c1".to_string(),
            output_value: serde_json::Value::String("ok".to_string()),
            status: ToolEndStatus::Error,
        };
        let data = build_frame_value(&event, None);
        assert_eq!(data["status"], "error");
    }

    #[tokio::test]
    async fn dropping_the_guarded_stream_cancels_the_token() {
        let cancel = CancellationToken::new();
        let inner = futures_util::stream::empty::<()>();
        let guarded = GuardedStream::new(inner, cancel.clone());
        assert!(!cancel.is_cancelled());
        drop(guarded);
        assert!(cancel.is_cancelled());
    }
}
