//! Streaming Transport (C7): an axum HTTP server exposing one endpoint,
//! `POST /v1/turns`, that runs a turn through [`agent_core::AgentRunner`] and
//! streams its events back as `text/event-stream`.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`], [`app::AppState`].

pub mod app;
pub mod auth;
pub mod sse;
pub mod turn;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use app::{router, AppState};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Runs the server on an already-bound listener. Used by tests (bind to
/// `127.0.0.1:0`, then pass the listener in to read back the assigned port).
pub async fn run_serve_on_listener(
    listener: TcpListener,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("turn endpoint listening on http://{}/v1/turns", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Runs the server, binding `addr` (default from `BIND_ADDR`, else
/// `127.0.0.1:8080`).
pub async fn run_serve(
    addr: Option<&str>,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let bind_addr = addr
        .map(str::to_string)
        .or_else(|| std::env::var("BIND_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    run_serve_on_listener(listener, state).await
}
