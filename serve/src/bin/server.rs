//! Process entry point: loads configuration, wires the Agent Execution Core
//! to the Shared Sandbox's tool set, and serves the turn endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use agent_core::{AgentFactory, AgentRunner, Checkpointer, EnvironmentDefaults, MemorySaver, NoUserSettings, SessionConfigResolver, SqliteSaver};
use sandbox::{ReadFileTool, SandboxConfig, SharedSandbox, ShellExecTool, WriteFileTool};
use serve::app::AppState;
use serve::auth::StaticTokenVerifier;
use tracing_subscriber::EnvFilter;

const DEFAULT_AGENT_CACHE_CAPACITY: usize = 32;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Builds the checkpoint store from `CHECKPOINT_STORE_URL`: `sqlite::memory:`
/// (or an unset/empty value) selects the in-memory store for dev and tests;
/// anything else is treated as a SQLite file path.
fn build_checkpointer(raw: Option<&str>) -> Arc<dyn Checkpointer> {
    match raw {
        None | Some("") | Some("sqlite::memory:") => Arc::new(MemorySaver::new()),
        Some(path) => {
            let path = path.strip_prefix("sqlite:").unwrap_or(path);
            match SqliteSaver::new(path) {
                Ok(saver) => Arc::new(saver),
                Err(e) => {
                    tracing::error!(error = %e, %path, "failed to open checkpoint store, falling back to in-memory");
                    Arc::new(MemorySaver::new())
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = config::load_and_apply("agent-server", None);
    init_tracing();

    let env: HashMap<String, String> = std::env::vars().collect();

    let sandbox_config = SandboxConfig::from_map(&env);
    let shared_sandbox = Arc::new(SharedSandbox::new(sandbox_config)?);
    let tools: Vec<Box<dyn agent_core::Tool>> = vec![
        Box::new(ShellExecTool::new(shared_sandbox.clone())),
        Box::new(WriteFileTool::new(shared_sandbox.clone())),
        Box::new(ReadFileTool::new(shared_sandbox.clone())),
    ];

    let agent_cache_capacity = env
        .get("AGENT_CACHE_CAPACITY")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_AGENT_CACHE_CAPACITY);
    let factory = Arc::new(AgentFactory::with_capacity(tools, agent_cache_capacity).await);

    let checkpointer = build_checkpointer(env.get("CHECKPOINT_STORE_URL").map(String::as_str));
    let session_config = Arc::new(SessionConfigResolver::new(
        Arc::new(NoUserSettings),
        EnvironmentDefaults::from_map(&env),
    ));
    let runner = Arc::new(AgentRunner::new(factory, checkpointer, session_config));

    let state = Arc::new(AppState {
        runner,
        auth: Arc::new(StaticTokenVerifier::from_map(&env)),
    });

    serve::run_serve(None, state).await
}
