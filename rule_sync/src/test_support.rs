//! Fakes shared by unit tests.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use rule_model::RuleKind;

use crate::error::{Result, SyncError};
use crate::fleet::RuleApplier;

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyCall {
    pub app: String,
    pub ip: String,
    pub port: u16,
    pub kind: RuleKind,
    pub payload: String,
}

/// Records every apply; fails for configured IPs
#[derive(Debug, Default)]
pub struct RecordingApplier {
    calls: Mutex<Vec<ApplyCall>>,
    failing_ips: Mutex<HashSet<String>>,
}

impl RecordingApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, ip: &str) {
        self.failing_ips.lock().insert(ip.to_string());
    }

    pub fn calls(&self) -> Vec<ApplyCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RuleApplier for RecordingApplier {
    async fn apply(&self, app: &str, ip: &str, port: u16, kind: RuleKind, payload: &str) -> Result<()> {
        self.calls.lock().push(ApplyCall {
            app: app.to_string(),
            ip: ip.to_string(),
            port,
            kind,
            payload: payload.to_string(),
        });
        if self.failing_ips.lock().contains(ip) {
            return Err(SyncError::Push {
                address: format!("{}:{}", ip, port),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}
