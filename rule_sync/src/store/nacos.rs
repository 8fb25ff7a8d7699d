//! Config store client for the Nacos open config API.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;

use super::ConfigStore;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};

const CONNECT_TIMEOUT_MS: u64 = 2_000;
const REQUEST_TIMEOUT_MS: u64 = 5_000;
const CONFIGS_PATH: &str = "nacos/v1/cs/configs";

/// Blocking HTTP client for `/nacos/v1/cs/configs`
pub struct NacosConfigStore {
    /// Shared HTTP client (reqwest + rustls)
    http_client: Client,
    base_url: String,
    namespace: Option<String>,
}

impl NacosConfigStore {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_millis(CONNECT_TIMEOUT_MS))
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .build()?;

        Ok(NacosConfigStore {
            http_client,
            base_url: base_url(&config.server_addr()),
            namespace: config.effective_namespace().map(str::to_string),
        })
    }

    /// Server root every request is made against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, CONFIGS_PATH)
    }

    fn params<'a>(&'a self, key: &'a str, group: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("dataId", key), ("group", group)];
        if let Some(namespace) = self.namespace.as_deref() {
            params.push(("tenant", namespace));
        }
        params
    }
}

impl ConfigStore for NacosConfigStore {
    fn publish(&self, key: &str, group: &str, value: &str) -> Result<bool> {
        let mut form = self.params(key, group);
        form.push(("content", value));

        let response = self.http_client.post(self.endpoint()).form(&form).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Store(format!(
                "publish {} to group {} returned {}",
                key, group, status
            )));
        }
        let body = response.text()?;
        debug!("Published {} ({} bytes) -> {}", key, value.len(), body.trim());
        Ok(body.trim() == "true")
    }

    fn fetch(&self, key: &str, group: &str, timeout: Duration) -> Result<Option<String>> {
        let response = self
            .http_client
            .get(self.endpoint())
            .query(&self.params(key, group))
            .timeout(timeout)
            .send()?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.text()?)),
            status => Err(SyncError::Store(format!(
                "fetch {} from group {} returned {}",
                key, group, status
            ))),
        }
    }
}

fn base_url(server_addr: &str) -> String {
    let trimmed = server_addr.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("localhost:8848"), "http://localhost:8848");
        assert_eq!(base_url("https://nacos.internal/"), "https://nacos.internal");
    }

    #[test]
    fn test_params_include_tenant_only_when_namespace_set() {
        let store = NacosConfigStore::new(&SyncConfig::default()).unwrap();
        assert_eq!(store.params("k", "G"), vec![("dataId", "k"), ("group", "G")]);
        assert_eq!(store.endpoint(), "http://localhost:8848/nacos/v1/cs/configs");

        let config = SyncConfig {
            namespace: Some("dev".to_string()),
            ..SyncConfig::default()
        };
        let store = NacosConfigStore::new(&config).unwrap();
        assert_eq!(store.params("k", "G").last(), Some(&("tenant", "dev")));
    }
}
