//! Shared helpers for e2e tests against the turn endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use agent_core::{AgentFactory, AgentRunner, EnvironmentDefaults, MemorySaver, NoUserSettings, SessionConfigResolver};
use serve::app::AppState;
use serve::auth::StaticTokenVerifier;
use tokio::net::TcpListener;

pub const TEST_TOKEN: &str = "test-token";
pub const TEST_USER: &str = "test-user";

/// Builds an [`AppState`] with an in-memory checkpoint store and no sandbox
/// tools — enough to exercise the transport layer without a live Docker
/// daemon. Tests that need real tool execution set `AGENT_E2E_RUN_AGENT`
/// and are skipped otherwise.
pub async fn test_state() -> Arc<AppState> {
    test_state_with_model(None).await
}

pub async fn test_state_with_model(model: Option<&str>) -> Arc<AppState> {
    let mut env: HashMap<String, String> = std::env::vars().collect();
    if let Some(model) = model {
        env.insert("LLM_DEFAULT_MODEL".to_string(), model.to_string());
    }
    let factory = Arc::new(AgentFactory::with_capacity(vec![], 4).await);
    let checkpointer: Arc<dyn agent_core::Checkpointer> = Arc::new(MemorySaver::new());
    let session_config = Arc::new(SessionConfigResolver::new(
        Arc::new(NoUserSettings),
        EnvironmentDefaults::from_map(&env),
    ));
    let mut tokens = HashMap::new();
    tokens.insert("AUTH_TOKENS".to_string(), format!("{TEST_TOKEN}:{TEST_USER}"));
    Arc::new(AppState {
        runner: Arc::new(AgentRunner::new(factory, checkpointer, session_config)),
        auth: Arc::new(StaticTokenVerifier::from_map(&tokens)),
    })
}

/// Binds to a random port and spawns the server. Returns the base URL
/// (`http://127.0.0.1:<port>`) and the server task's join handle.
pub async fn spawn_server(state: Arc<AppState>) -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{addr}");
    let handle = tokio::spawn(async move {
        let _ = serve::run_serve_on_listener(listener, state).await;
    });
    (url, handle)
}
