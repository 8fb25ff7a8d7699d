//! HTTP rule applier speaking the client machines' command API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use rule_model::RuleKind;

use super::RuleApplier;
use crate::error::{Result, SyncError};

const CONNECT_TIMEOUT_MS: u64 = 1_000;
const SUCCESS_BODY: &str = "success";

/// Command endpoint and optional `type` parameter for a kind
fn command_for(kind: RuleKind) -> (&'static str, Option<&'static str>) {
    match kind {
        RuleKind::Flow => ("setRules", Some("flow")),
        RuleKind::Degrade => ("setRules", Some("degrade")),
        RuleKind::System => ("setRules", Some("system")),
        RuleKind::Authority => ("setRules", Some("authority")),
        RuleKind::ParamFlow => ("setParamFlowRules", None),
        RuleKind::Api => ("gateway/updateApiDefinitions", None),
        RuleKind::Gateway => ("gateway/updateRules", None),
    }
}

pub struct SentinelApiClient {
    /// Shared HTTP client (reqwest + rustls)
    http_client: Client,
}

impl SentinelApiClient {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_millis(CONNECT_TIMEOUT_MS))
            .timeout(request_timeout)
            .build()?;
        Ok(SentinelApiClient { http_client })
    }

    fn endpoint(ip: &str, port: u16, command: &str) -> String {
        format!("http://{}:{}/{}", ip, port, command)
    }
}

#[async_trait]
impl RuleApplier for SentinelApiClient {
    async fn apply(&self, app: &str, ip: &str, port: u16, kind: RuleKind, payload: &str) -> Result<()> {
        let (command, rule_type) = command_for(kind);
        let address = format!("{}:{}", ip, port);

        let mut form = vec![("data", payload)];
        if let Some(rule_type) = rule_type {
            form.push(("type", rule_type));
        }

        let response = self
            .http_client
            .post(Self::endpoint(ip, port, command))
            .form(&form)
            .send()
            .await
            .map_err(|e| SyncError::Push {
                address: address.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() || body.trim() != SUCCESS_BODY {
            return Err(SyncError::Push {
                address,
                reason: format!("{} {}", status, body.trim()),
            });
        }

        debug!("Applied {} rules of {} on {}", kind, app, address);
        Ok(())
    }
}
