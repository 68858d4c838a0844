//! Session Config Resolver: turns `(user_id, thread_id)` into the runtime
//! configuration a turn needs (model, credentials, recursion bound).
//!
//! Resolution per field, first non-empty wins: per-user settings store →
//! process environment → hard default. The per-user settings store is an
//! external collaborator the core has no concrete dependency on; it's
//! reached only through [`UserSettingsProvider`].

use std::collections::HashMap;

use async_trait::async_trait;

/// Resolved per-turn configuration. Ephemeral; never persisted.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub thread_id: String,
    pub user_id: String,
    pub llm_model: String,
    pub api_key: String,
    pub base_url: String,
    pub max_output_tokens: Option<u32>,
    pub recursion_bound: usize,
    pub extra: HashMap<String, String>,
}

/// Per-user LLM settings, as held by the external per-user settings store.
/// Any field left `None` falls through to the process-environment default,
/// then to the hard default.
#[derive(Debug, Clone, Default)]
pub struct UserSettings {
    pub llm_model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub recursion_bound: Option<usize>,
}

/// External collaborator: maps a `user_id` to their stored LLM settings.
/// The core depends on this trait only, never on how settings are stored.
#[async_trait]
pub trait UserSettingsProvider: Send + Sync {
    async fn settings_for(&self, user_id: &str) -> UserSettings;
}

/// A provider with no per-user overrides; every field falls through to
/// environment/hard defaults. Useful for single-tenant deployments and tests.
pub struct NoUserSettings;

#[async_trait]
impl UserSettingsProvider for NoUserSettings {
    async fn settings_for(&self, _user_id: &str) -> UserSettings {
        UserSettings::default()
    }
}

/// Process-environment and hard-coded fallbacks, read once at construction
/// from an already-loaded environment (populated by `config::load_and_apply`
/// at startup) rather than via ad hoc `std::env::var` calls at resolve time,
/// so resolution is deterministic and testable against an in-memory map.
#[derive(Debug, Clone)]
pub struct EnvironmentDefaults {
    pub llm_model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub recursion_bound: usize,
}

/// Server-side ceiling on `recursion_bound`; per-user/per-turn values are
/// clamped to this regardless of what a client or settings store requests.
pub const MAX_RECURSION_BOUND: usize = 1000;
const DEFAULT_RECURSION_BOUND: usize = 1000;
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

impl EnvironmentDefaults {
    /// Reads `LLM_DEFAULT_MODEL`, `LLM_API_KEY`, `LLM_API_BASE`,
    /// `RECURSION_LIMIT` from the process environment.
    pub fn from_process_env() -> Self {
        Self::from_map(&std::env::vars().collect())
    }

    /// Builds from an explicit map, for deterministic tests.
    pub fn from_map(env: &HashMap<String, String>) -> Self {
        Self {
            llm_model: env.get("LLM_DEFAULT_MODEL").cloned(),
            api_key: env.get("LLM_API_KEY").cloned(),
            base_url: env.get("LLM_API_BASE").cloned(),
            recursion_bound: env
                .get("RECURSION_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RECURSION_BOUND),
        }
    }
}

/// Resolves [`SessionConfig`] for a turn from a [`UserSettingsProvider`] and
/// [`EnvironmentDefaults`].
pub struct SessionConfigResolver {
    provider: std::sync::Arc<dyn UserSettingsProvider>,
    env_defaults: EnvironmentDefaults,
}

impl SessionConfigResolver {
    pub fn new(provider: std::sync::Arc<dyn UserSettingsProvider>, env_defaults: EnvironmentDefaults) -> Self {
        Self {
            provider,
            env_defaults,
        }
    }

    pub async fn resolve(&self, user_id: &str, thread_id: &str) -> SessionConfig {
        let settings = self.provider.settings_for(user_id).await;

        let llm_model = settings
            .llm_model
            .or_else(|| self.env_defaults.llm_model.clone())
            .unwrap_or_else(|| "gpt-4o-mini".to_string());
        let api_key = settings
            .api_key
            .or_else(|| self.env_defaults.api_key.clone())
            .unwrap_or_default();
        let base_url = settings
            .base_url
            .or_else(|| self.env_defaults.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let recursion_bound = settings
            .recursion_bound
            .unwrap_or(self.env_defaults.recursion_bound)
            .min(MAX_RECURSION_BOUND);

        SessionConfig {
            thread_id: thread_id.to_string(),
            user_id: user_id.to_string(),
            llm_model,
            api_key,
            base_url,
            max_output_tokens: settings.max_output_tokens,
            recursion_bound,
            extra: HashMap::new(),
        }
    }
}
