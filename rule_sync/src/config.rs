//! # Sync Configuration
//!
//! Settings for the external config store, resolved once at startup: defaults,
//! then an optional JSON file, then environment variables.

use std::path::Path;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

pub const ENV_SERVER_ADDR: &str = "NACOS_SERVER_ADDR";
pub const ENV_IP: &str = "NACOS_IP";
pub const ENV_PORT: &str = "NACOS_PORT";
pub const ENV_NAMESPACE: &str = "NACOS_NAMESPACE";
pub const ENV_GROUP_ID: &str = "NACOS_GROUP_ID";

const DEFAULT_IP: &str = "localhost";
const DEFAULT_PORT: &str = "8848";
const DEFAULT_GROUP_ID: &str = "DEFAULT_GROUP";
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_PUSH_TIMEOUT_MS: u64 = 3_000;

/// Configuration for external synchronization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Whether rules are mirrored to the store and pushed to machines
    pub enable: bool,
    pub ip: String,
    pub port: String,
    /// Store namespace (tenant); blank means the public namespace
    pub namespace: Option<String>,
    pub group_id: String,
    /// Full `host:port` of the store; wins over `ip`/`port` when set
    pub server_addr: Option<String>,
    /// Bounded wait for store reads
    pub fetch_timeout_ms: u64,
    /// Per-machine request timeout for rule pushes
    pub push_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enable: false,
            ip: DEFAULT_IP.to_string(),
            port: DEFAULT_PORT.to_string(),
            namespace: None,
            group_id: DEFAULT_GROUP_ID.to_string(),
            server_addr: None,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            push_timeout_ms: DEFAULT_PUSH_TIMEOUT_MS,
        }
    }
}

impl SyncConfig {
    /// Loads the optional JSON file, then applies process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides();
        info!(
            "Rule sync {} (store {}, group {})",
            if config.enable { "enabled" } else { "disabled" },
            config.server_addr(),
            config.group_id
        );
        Ok(config)
    }

    /// Reads static configuration; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Applies `NACOS_*` environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ip = non_blank(ENV_IP);
        let port = non_blank(ENV_PORT);
        // An ip or port from the environment outranks a file-level server address.
        if ip.is_some() || port.is_some() {
            self.server_addr = None;
        }
        if let Some(ip) = ip {
            self.ip = ip;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(addr) = non_blank(ENV_SERVER_ADDR) {
            self.server_addr = Some(addr);
        }
        if let Some(namespace) = non_blank(ENV_NAMESPACE) {
            self.namespace = Some(namespace);
        }
        if let Some(group_id) = non_blank(ENV_GROUP_ID) {
            self.group_id = group_id;
        }
        self
    }

    /// Effective store address
    pub fn server_addr(&self) -> String {
        match self.server_addr.as_deref().map(str::trim) {
            Some(addr) if !addr.is_empty() => addr.to_string(),
            _ => format!("{}:{}", self.ip, self.port),
        }
    }

    /// Namespace to send, `None` for the public namespace
    pub fn effective_namespace(&self) -> Option<&str> {
        self.namespace
            .as_deref()
            .map(str::trim)
            .filter(|ns| !ns.is_empty())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert!(!config.enable);
        assert_eq!(config.server_addr(), "localhost:8848");
        assert_eq!(config.group_id, "DEFAULT_GROUP");
        assert_eq!(config.effective_namespace(), None);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_env_overrides_ip_and_port() {
        let config = SyncConfig::default()
            .apply_overrides(lookup(&[(ENV_IP, "10.1.1.1"), (ENV_PORT, "9848")]));
        assert_eq!(config.server_addr(), "10.1.1.1:9848");
    }

    #[test]
    fn test_server_addr_wins_over_ip_and_port() {
        let config = SyncConfig::default().apply_overrides(lookup(&[
            (ENV_IP, "10.1.1.1"),
            (ENV_SERVER_ADDR, "nacos.internal:8848"),
        ]));
        assert_eq!(config.server_addr(), "nacos.internal:8848");
    }

    #[test]
    fn test_env_ip_and_port_beat_file_server_addr() {
        let config = SyncConfig {
            server_addr: Some("static-host:1111".to_string()),
            ..SyncConfig::default()
        }
        .apply_overrides(lookup(&[(ENV_IP, "10.9.9.9"), (ENV_PORT, "9999")]));
        assert_eq!(config.server_addr(), "10.9.9.9:9999");

        let untouched = SyncConfig {
            server_addr: Some("static-host:1111".to_string()),
            ..SyncConfig::default()
        }
        .apply_overrides(lookup(&[]));
        assert_eq!(untouched.server_addr(), "static-host:1111");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = SyncConfig {
            group_id: "RULES".to_string(),
            ..SyncConfig::default()
        }
        .apply_overrides(lookup(&[(ENV_GROUP_ID, "  "), (ENV_NAMESPACE, "")]));
        assert_eq!(config.group_id, "RULES");
        assert_eq!(config.namespace, None);
    }

    #[test]
    fn test_from_json_file_keeps_defaults_for_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"enable": true, "groupId": "SENTINEL_GROUP", "namespace": "dev"}}"#).unwrap();

        let config = SyncConfig::from_json_file(file.path()).unwrap();
        assert!(config.enable);
        assert_eq!(config.group_id, "SENTINEL_GROUP");
        assert_eq!(config.effective_namespace(), Some("dev"));
        assert_eq!(config.port, "8848");
    }

    #[test]
    fn test_from_json_file_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = SyncConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }
}
