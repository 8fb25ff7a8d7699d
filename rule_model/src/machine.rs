//! Machine identity of a process running a monitored application.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A single machine (ip + port) of an application.
///
/// Identity is `(app, ip, port)`. The health flag is state, not identity, so
/// two values differing only in `healthy` compare equal and hash alike. This
/// lets the same type key the by-machine index and drive push filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineInfo {
    pub app: String,
    pub ip: String,
    pub port: u16,
    pub healthy: bool,
}

impl MachineInfo {
    /// Creates a healthy machine
    pub fn new(app: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        MachineInfo {
            app: app.into(),
            ip: ip.into(),
            port,
            healthy: true,
        }
    }

    pub fn with_health(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }

    /// `ip:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl PartialEq for MachineInfo {
    fn eq(&self, other: &Self) -> bool {
        self.app == other.app && self.ip == other.ip && self.port == other.port
    }
}

impl Eq for MachineInfo {}

impl Hash for MachineInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.app.hash(state);
        self.ip.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for MachineInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.app, self.ip, self.port)
    }
}
