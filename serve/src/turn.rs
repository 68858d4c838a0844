//! Turn endpoint: `POST /v1/turns` → `text/event-stream`.

use std::convert::Infallible;
use std::sync::Arc;

use agent_core::{ErrorKind, StreamEvent};
use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::app::AppState;
use crate::sse::{to_sse_event, wire_error_kind, GuardedStream, DONE_SENTINEL};

#[derive(Debug, Deserialize)]
struct TurnRequest {
    message: String,
    #[serde(default)]
    thread_id: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
}

fn error_response(status: StatusCode, kind: &str, detail: impl Into<String>) -> Response {
    (status, Json(json!({ "kind": kind, "detail": detail.into() }))).into_response()
}

/// Handles one turn request: verifies the bearer token, assigns a
/// `thread_id` if the caller didn't supply one, runs the turn, and streams
/// its events back as SSE. `thread-busy` is surfaced as a plain JSON error
/// before the stream opens; every other outcome streams.
pub async fn turn(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let user_id = match bearer_token(&headers) {
        Some(token) => match state.auth.verify(token).await {
            Some(user_id) => user_id,
            None => return error_response(StatusCode::UNAUTHORIZED, "auth-required", "invalid bearer token"),
        },
        None => return error_response(StatusCode::UNAUTHORIZED, "auth-required", "missing bearer token"),
    };

    let req: TurnRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "internal", format!("invalid request body: {e}"))
        }
    };
    if req.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "internal", "message must not be empty");
    }

    let assigned = req.thread_id.is_none();
    let thread_id = req.thread_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let cancel = CancellationToken::new();
    let mut rx = state.runner.run_turn(user_id, thread_id.clone(), req.message, cancel.clone());

    let first = match rx.recv().await {
        Some(event) => event,
        None => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", "turn produced no events")
        }
    };
    if let StreamEvent::Error { kind: ErrorKind::ThreadBusy, detail } = &first {
        return error_response(StatusCode::CONFLICT, wire_error_kind(ErrorKind::ThreadBusy), detail.clone());
    }

    let assigned_thread_id = assigned.then(|| thread_id.clone());
    let mut injected = false;
    let events = futures_util::stream::once(async move { first }).chain(ReceiverStream::new(rx));
    let frames = events.map(move |event| {
        let inject = if injected { None } else { assigned_thread_id.as_deref() };
        injected = true;
        Ok::<Event, Infallible>(to_sse_event(&event, inject))
    });
    let frames = frames.chain(futures_util::stream::once(async {
        Ok::<Event, Infallible>(Event::default().data(DONE_SENTINEL))
    }));

    Sse::new(GuardedStream::new(frames, cancel)).into_response()
}
