//! Caller allow/deny list rules.

use serde::{Deserialize, Serialize};

use super::is_blank;
use crate::entity::{RuleBase, RuleEntity};
use crate::kind::RuleKind;

/// Allows or denies a comma-separated list of caller origins on a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityRuleEntity {
    #[serde(flatten)]
    pub base: RuleBase,

    pub resource: String,
    pub limit_app: String,
    /// 0 = white list, 1 = black list
    pub strategy: i32,
}

impl AuthorityRuleEntity {
    pub const WHITE_LIST: i32 = 0;
    pub const BLACK_LIST: i32 = 1;

    pub fn new(base: RuleBase, resource: impl Into<String>, limit_app: impl Into<String>, strategy: i32) -> Self {
        AuthorityRuleEntity {
            base,
            resource: resource.into(),
            limit_app: limit_app.into(),
            strategy,
        }
    }
}

impl RuleEntity for AuthorityRuleEntity {
    const KIND: RuleKind = RuleKind::Authority;

    fn base(&self) -> &RuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RuleBase {
        &mut self.base
    }

    // An authority rule without origins would match nobody.
    fn pre_process(self) -> Option<Self> {
        if is_blank(&self.resource) || is_blank(&self.limit_app) {
            return None;
        }
        Some(self)
    }
}
