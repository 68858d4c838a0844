//! Authentication: Bearer token verification is delegated to an external
//! collaborator, mirroring `agent_core::session_config::UserSettingsProvider`
//! — this crate depends on the [`AuthVerifier`] trait only, never on how or
//! where tokens are issued.

use std::collections::HashMap;

use async_trait::async_trait;

/// Verifies a bearer token and, on success, returns the verified `user_id`
/// the core should run the turn as.
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, bearer_token: &str) -> Option<String>;
}

/// Looks up tokens in a fixed `token:user_id` map read once from the
/// process environment (`AUTH_TOKENS`, comma-separated `token:user_id`
/// pairs). Meant for single-node/dev deployments; a production deployment
/// would swap in a verifier backed by its own identity provider without
/// this crate or `agent-core` changing.
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn from_process_env() -> Self {
        Self::from_map(&std::env::vars().collect())
    }

    pub fn from_map(env: &HashMap<String, String>) -> Self {
        let tokens = env
            .get("AUTH_TOKENS")
            .map(|raw| parse_tokens(raw))
            .unwrap_or_default();
        Self { tokens }
    }
}

fn parse_tokens(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|pair| {
            let (token, user_id) = pair.split_once(':')?;
            let token = token.trim();
            let user_id = user_id.trim();
            if token.is_empty() || user_id.is_empty() {
                return None;
            }
            Some((token.to_string(), user_id.to_string()))
        })
        .collect()
}

#[async_trait]
impl AuthVerifier for StaticTokenVerifier {
    async fn verify(&self, bearer_token: &str) -> Option<String> {
        self.tokens.get(bearer_token).cloned()
    }
}
