//! Circuit-breaking rules.

use serde::{Deserialize, Serialize};

use super::{is_blank, DEFAULT_LIMIT_APP};
use crate::entity::{RuleBase, RuleEntity};
use crate::kind::RuleKind;

/// Opens a circuit on a resource when slow calls or errors cross a threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradeRuleEntity {
    #[serde(flatten)]
    pub base: RuleBase,

    pub resource: String,
    #[serde(default)]
    pub limit_app: String,
    /// 0 = slow-call ratio, 1 = exception ratio, 2 = exception count
    pub grade: i32,
    pub count: f64,
    /// Seconds the circuit stays open
    pub time_window: i32,
    pub min_request_amount: Option<i32>,
    pub slow_ratio_threshold: Option<f64>,
    pub stat_interval_ms: Option<i32>,
}

impl DegradeRuleEntity {
    pub fn new(base: RuleBase, resource: impl Into<String>, grade: i32, count: f64, time_window: i32) -> Self {
        DegradeRuleEntity {
            base,
            resource: resource.into(),
            limit_app: DEFAULT_LIMIT_APP.to_string(),
            grade,
            count,
            time_window,
            min_request_amount: None,
            slow_ratio_threshold: None,
            stat_interval_ms: None,
        }
    }
}

impl RuleEntity for DegradeRuleEntity {
    const KIND: RuleKind = RuleKind::Degrade;

    fn base(&self) -> &RuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RuleBase {
        &mut self.base
    }

    fn pre_process(mut self) -> Option<Self> {
        if is_blank(&self.resource) {
            return None;
        }
        if is_blank(&self.limit_app) {
            self.limit_app = DEFAULT_LIMIT_APP.to_string();
        }
        Some(self)
    }
}
