//! Whole-system adaptive protection rules.

use serde::{Deserialize, Serialize};

use crate::entity::{RuleBase, RuleEntity};
use crate::kind::RuleKind;

/// Machine-wide thresholds; a negative value leaves that dimension unchecked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemRuleEntity {
    #[serde(flatten)]
    pub base: RuleBase,

    #[serde(default = "unset_f64")]
    pub highest_system_load: f64,
    #[serde(default = "unset_f64")]
    pub highest_cpu_usage: f64,
    #[serde(default = "unset_i64")]
    pub avg_rt: i64,
    #[serde(default = "unset_i64")]
    pub max_thread: i64,
    #[serde(default = "unset_f64")]
    pub qps: f64,
}

fn unset_f64() -> f64 {
    -1.0
}

fn unset_i64() -> i64 {
    -1
}

impl SystemRuleEntity {
    /// Rule with every threshold unset
    pub fn new(base: RuleBase) -> Self {
        SystemRuleEntity {
            base,
            highest_system_load: unset_f64(),
            highest_cpu_usage: unset_f64(),
            avg_rt: unset_i64(),
            max_thread: unset_i64(),
            qps: unset_f64(),
        }
    }

    pub fn with_qps(mut self, qps: f64) -> Self {
        self.qps = qps;
        self
    }

    pub fn with_max_thread(mut self, max_thread: i64) -> Self {
        self.max_thread = max_thread;
        self
    }

    fn has_threshold(&self) -> bool {
        self.highest_system_load >= 0.0
            || self.highest_cpu_usage >= 0.0
            || self.avg_rt >= 0
            || self.max_thread >= 0
            || self.qps >= 0.0
    }
}

impl RuleEntity for SystemRuleEntity {
    const KIND: RuleKind = RuleKind::System;

    fn base(&self) -> &RuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RuleBase {
        &mut self.base
    }

    fn pre_process(self) -> Option<Self> {
        self.has_threshold().then_some(self)
    }
}
