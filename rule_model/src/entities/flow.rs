//! Flow control rules (QPS or concurrent-thread limiting per resource).

use serde::{Deserialize, Serialize};

use super::{is_blank, DEFAULT_LIMIT_APP};
use crate::entity::{RuleBase, RuleEntity};
use crate::kind::RuleKind;

/// Limits traffic to a resource by QPS or by concurrent threads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRuleEntity {
    #[serde(flatten)]
    pub base: RuleBase,

    pub resource: String,
    /// Caller origin the rule applies to
    #[serde(default)]
    pub limit_app: String,
    /// 0 = thread count, 1 = QPS
    pub grade: i32,
    pub count: f64,
    /// 0 = direct, 1 = relate, 2 = chain
    #[serde(default)]
    pub strategy: i32,
    pub ref_resource: Option<String>,
    /// 0 = reject, 1 = warm up, 2 = rate limiter, 3 = warm up + rate limiter
    #[serde(default)]
    pub control_behavior: i32,
    pub warm_up_period_sec: Option<i32>,
    pub max_queueing_time_ms: Option<i32>,
    #[serde(default)]
    pub cluster_mode: bool,
}

impl FlowRuleEntity {
    pub const GRADE_THREAD: i32 = 0;
    pub const GRADE_QPS: i32 = 1;

    /// QPS rule with the given threshold
    pub fn new(base: RuleBase, resource: impl Into<String>, count: f64) -> Self {
        FlowRuleEntity {
            base,
            resource: resource.into(),
            limit_app: DEFAULT_LIMIT_APP.to_string(),
            grade: Self::GRADE_QPS,
            count,
            strategy: 0,
            ref_resource: None,
            control_behavior: 0,
            warm_up_period_sec: None,
            max_queueing_time_ms: None,
            cluster_mode: false,
        }
    }

    pub fn with_limit_app(mut self, limit_app: impl Into<String>) -> Self {
        self.limit_app = limit_app.into();
        self
    }

    pub fn with_grade(mut self, grade: i32) -> Self {
        self.grade = grade;
        self
    }

    pub fn with_warm_up(mut self, period_sec: i32) -> Self {
        self.control_behavior = 1;
        self.warm_up_period_sec = Some(period_sec);
        self
    }
}

impl RuleEntity for FlowRuleEntity {
    const KIND: RuleKind = RuleKind::Flow;

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
