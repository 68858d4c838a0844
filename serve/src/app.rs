//! Axum app: shared state and router for the turn endpoint.

use std::sync::Arc;

use axum::routing::post;
use axum::Router;

use crate::auth::AuthVerifier;

/// State shared across every request: the turn runner and the auth
/// verifier. Built once at startup and handed to axum via `with_state`.
pub struct AppState {
    pub runner: Arc<agent_core::AgentRunner>,
    pub auth: Arc<dyn AuthVerifier>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/turns", post(crate::turn::turn))
        .with_state(state)
}
