//! Hot-parameter flow control rules.

use serde::{Deserialize, Serialize};

use super::{is_blank, DEFAULT_LIMIT_APP};
use crate::entity::{RuleBase, RuleEntity};
use crate::kind::RuleKind;

/// Limits traffic per distinct value of one call argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamFlowRuleEntity {
    #[serde(flatten)]
    pub base: RuleBase,

    pub resource: String,
    #[serde(default)]
    pub limit_app: String,
    #[serde(default = "default_grade")]
    pub grade: i32,
    /// Position of the hot argument
    pub param_idx: Option<i32>,
    pub count: f64,
    #[serde(default = "default_duration")]
    pub duration_in_sec: i64,
    #[serde(default)]
    pub burst_count: i32,
    #[serde(default)]
    pub control_behavior: i32,
    #[serde(default)]
    pub cluster_mode: bool,
}

fn default_grade() -> i32 {
    1
}

fn default_duration() -> i64 {
    1
}

impl ParamFlowRuleEntity {
    pub fn new(base: RuleBase, resource: impl Into<String>, param_idx: i32, count: f64) -> Self {
        ParamFlowRuleEntity {
            base,
            resource: resource.into(),
            limit_app: DEFAULT_LIMIT_APP.to_string(),
            grade: default_grade(),
            param_idx: Some(param_idx),
            count,
            duration_in_sec: default_duration(),
            burst_count: 0,
            control_behavior: 0,
            cluster_mode: false,
        }
    }
}

impl RuleEntity for ParamFlowRuleEntity {
    const KIND: RuleKind = RuleKind::ParamFlow;

    fn base(&self) -> &RuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RuleBase {
        &mut self.base
    }

    fn pre_process(mut self) -> Option<Self> {
        if is_blank(&self.resource) || !matches!(self.param_idx, Some(idx) if idx >= 0) {
            return None;
        }
        if is_blank(&self.limit_app) {
            self.limit_app = DEFAULT_LIMIT_APP.to_string();
        }
        Some(self)
    }
}
