//! Sandbox resource policy, read from process environment at construction
//! (not ad hoc per call), mirroring `agent_core::session_config::EnvironmentDefaults`.

use std::collections::HashMap;

const DEFAULT_IMAGE: &str = "agent-sandbox:latest";
const DEFAULT_WORKSPACE_ROOT: &str = "/workspace";
const DEFAULT_CONTAINER_NAME: &str = "agent-sandbox";
const DEFAULT_VOLUME_NAME: &str = "agent-sandbox-workspace";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TIMEOUT_MAX_SECS: u64 = 300;
const DEFAULT_OUTPUT_CAP_BYTES: usize = 128 * 1024;
const DEFAULT_UID: u32 = 10_000;
const DEFAULT_GID: u32 = 10_000;

/// Resource policy and identity for the single shared sandbox container.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub image: String,
    pub container_name: String,
    pub volume_name: String,
    pub workspace_root: String,
    pub network_enabled: bool,
    pub cpu_limit: Option<f64>,
    pub memory_limit_bytes: Option<i64>,
    pub uid: u32,
    pub gid: u32,
    pub exec_timeout_default: std::time::Duration,
    pub exec_timeout_max: std::time::Duration,
    pub output_cap_bytes: usize,
}

impl SandboxConfig {
    pub fn from_process_env() -> Self {
        Self::from_map(&std::env::vars().collect())
    }

    pub fn from_map(env: &HashMap<String, String>) -> Self {
        Self {
            image: env.get("SANDBOX_IMAGE").cloned().unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            volume_name: DEFAULT_VOLUME_NAME.to_string(),
            workspace_root: env
                .get("SANDBOX_WORKSPACE_ROOT")
                .cloned()
                .unwrap_or_else(|| DEFAULT_WORKSPACE_ROOT.to_string()),
            network_enabled: env.get("SANDBOX_NETWORK").map(|v| v == "enabled").unwrap_or(false),
            cpu_limit: env.get("SANDBOX_CPU_LIMIT").and_then(|v| v.parse::<f64>().ok()),
            memory_limit_bytes: env.get("SANDBOX_MEMORY_LIMIT").and_then(|v| parse_byte_size(v)),
            uid: DEFAULT_UID,
            gid: DEFAULT_GID,
            exec_timeout_default: env
                .get("SANDBOX_TIMEOUT_DEFAULT")
                .and_then(|v| v.parse::<u64>().ok())
                .map(std::time::Duration::from_secs)
                .unwrap_or(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            exec_timeout_max: std::time::Duration::from_secs(DEFAULT_TIMEOUT_MAX_SECS),
            output_cap_bytes: env
                .get("TOOL_OUTPUT_CAP_BYTES")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(DEFAULT_OUTPUT_CAP_BYTES),
        }
    }

    /// CPU limit translated into bollard's `nano_cpus` (billionths of a CPU).
    pub fn nano_cpus(&self) -> Option<i64> {
        self.cpu_limit.map(|cores| (cores * 1_000_000_000.0) as i64)
    }

    pub fn user_spec(&self) -> String {
        format!("{}:{}", self.uid, self.gid)
    }

    pub fn user_workspace(&self, user_id: &str) -> String {
        format!("{}/{}", self.workspace_root.trim_end_matches('/'), user_id)
    }
}

/// Parses a byte-size string such as `512m`, `2g`, or a bare byte count.
fn parse_byte_size(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }
    let (digits, multiplier) = match raw.to_ascii_lowercase().chars().last()? {
        'k' => (&raw[..raw.len() - 1], 1024i64),
        'm' => (&raw[..raw.len() - 1], 1024 * 1024),
        'g' => (&raw[..raw.len() - 1], 1024 * 1024 * 1024),
        _ => return None,
    };
    digits.parse::<i64>().ok().map(|n| n * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_apply_when_env_empty() {
        let cfg = SandboxConfig::from_map(&env(&[]));
        assert_eq!(cfg.image, DEFAULT_IMAGE);
        assert!(!cfg.network_enabled);
        assert_eq!(cfg.cpu_limit, None);
    }

    #[test]
    fn memory_limit_parses_suffixed_sizes() {
        let cfg = SandboxConfig::from_map(&env(&[("SANDBOX_MEMORY_LIMIT", "512m")]));
        assert_eq!(cfg.memory_limit_bytes, Some(512 * 1024 * 1024));
    }

    #[test]
    fn network_enabled_only_on_exact_match() {
        let cfg = SandboxConfig::from_map(&env(&[("SANDBOX_NETWORK", "enabled")]));
        assert!(cfg.network_enabled);
        let cfg = SandboxConfig::from_map(&env(&[("SANDBOX_NETWORK", "true")]));
        assert!(!cfg.network_enabled);
    }

    #[test]
    fn cpu_limit_translates_to_nano_cpus() {
        let cfg = SandboxConfig::from_map(&env(&[("SANDBOX_CPU_LIMIT", "1.5")]));
        assert_eq!(cfg.nano_cpus(), Some(1_500_000_000));
    }

    #[test]
    fn user_workspace_joins_root_and_user_id() {
        let cfg = SandboxConfig::from_map(&env(&[]));
        assert_eq!(cfg.user_workspace("user-1"), "/workspace/user-1");
    }
}
