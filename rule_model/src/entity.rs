//! # Rule Entity Trait
//!
//! Common interface for every rule kind stored by the dashboard, plus the
//! identity fields all kinds share.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::kind::RuleKind;
use crate::machine::MachineInfo;

// ================================================================================================
// RULE ENTITY TRAIT
// ================================================================================================

/// Common trait that all rule entities implement
///
/// The kind is a compile-time constant, so a repository knows which kind it
/// stores and which type to decode from the mirror without any reflection.
pub trait RuleEntity:
    Clone + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Kind of rule this entity type represents
    const KIND: RuleKind;

    /// Shared identity fields
    fn base(&self) -> &RuleBase;

    fn base_mut(&mut self) -> &mut RuleBase;

    /// Identifier, unset until the repository assigns one
    fn id(&self) -> Option<i64> {
        self.base().id
    }

    fn set_id(&mut self, id: i64) {
        self.base_mut().id = Some(id);
    }

    /// Owning application name
    fn app(&self) -> &str {
        &self.base().app
    }

    /// Target machine IP (empty means the whole app)
    fn ip(&self) -> &str {
        &self.base().ip
    }

    /// Target machine port
    fn port(&self) -> Option<u16> {
        self.base().port
    }

    /// Machine key this entity is indexed under
    fn machine(&self) -> MachineInfo {
        MachineInfo::new(self.app(), self.ip(), self.port().unwrap_or(0))
    }

    /// Kind-specific normalization run before indexing.
    ///
    /// Returning `None` rejects the entity.
    fn pre_process(self) -> Option<Self> {
        Some(self)
    }
}

// ================================================================================================
// SHARED FIELDS
// ================================================================================================

/// Identity fields shared by every rule kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBase {
    pub id: Option<i64>,
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub ip: String,
    pub port: Option<u16>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub gmt_create: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub gmt_modified: Option<DateTime<Utc>>,
}

impl RuleBase {
    /// Base for a rule targeting one machine of `app`
    pub fn new(app: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        let now = now_millis();
        RuleBase {
            id: None,
            app: app.into(),
            ip: ip.into(),
            port: Some(port),
            gmt_create: Some(now),
            gmt_modified: Some(now),
        }
    }

    /// Base for a rule that applies to every machine of `app`
    pub fn for_app(app: impl Into<String>) -> Self {
        let now = now_millis();
        RuleBase {
            app: app.into(),
            gmt_create: Some(now),
            gmt_modified: Some(now),
            ..Default::default()
        }
    }
}

/// Current time truncated to whole milliseconds, the resolution stored in the mirror
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_serializes_camel_case_millis() {
        let mut base = RuleBase::new("orderSvc", "10.0.0.1", 8080);
        base.id = Some(7);
        let json = serde_json::to_value(&base).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["app"], "orderSvc");
        assert!(json["gmtCreate"].is_i64());

        let back: RuleBase = serde_json::from_value(json).unwrap();
        assert_eq!(back, base);
    }

    #[test]
    fn test_base_tolerates_missing_fields() {
        let base: RuleBase = serde_json::from_str(r#"{"app":"a"}"#).unwrap();
        assert_eq!(base.id, None);
        assert_eq!(base.ip, "");
        assert_eq!(base.port, None);
        assert_eq!(base.gmt_create, None);
    }
}
