//! Gateway rules: API definitions and gateway flow control.

use serde::{Deserialize, Serialize};

use super::is_blank;
use crate::entity::{RuleBase, RuleEntity};
use crate::kind::RuleKind;

// ================================================================================================
// API DEFINITION
// ================================================================================================

/// One path predicate of an API definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPredicateItem {
    pub pattern: String,
    /// 0 = exact, 1 = prefix, 2 = regex
    #[serde(default)]
    pub match_strategy: i32,
}

/// Named group of gateway paths that gateway flow rules can target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinitionEntity {
    #[serde(flatten)]
    pub base: RuleBase,

    pub api_name: String,
    #[serde(default)]
    pub predicate_items: Vec<ApiPredicateItem>,
}

impl ApiDefinitionEntity {
    pub fn new(base: RuleBase, api_name: impl Into<String>) -> Self {
        ApiDefinitionEntity {
            base,
            api_name: api_name.into(),
            predicate_items: vec![],
        }
    }

    pub fn with_predicate(mut self, pattern: impl Into<String>, match_strategy: i32) -> Self {
        self.predicate_items.push(ApiPredicateItem {
            pattern: pattern.into(),
            match_strategy,
        });
        self
    }
}

impl RuleEntity for ApiDefinitionEntity {
    const KIND: RuleKind = RuleKind::Api;

    fn base(&self) -> &RuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RuleBase {
        &mut self.base
    }

    fn pre_process(self) -> Option<Self> {
        if is_blank(&self.api_name) {
            return None;
        }
        Some(self)
    }
}

// ================================================================================================
// GATEWAY FLOW RULE
// ================================================================================================

/// Flow control applied at the gateway to a route or an API definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayFlowRuleEntity {
    #[serde(flatten)]
    pub base: RuleBase,

    pub resource: String,
    /// 0 = route id, 1 = API definition name
    #[serde(default)]
    pub resource_mode: i32,
    #[serde(default = "default_grade")]
    pub grade: i32,
    pub count: f64,
    /// Length of the statistic window in `interval_unit`
    pub interval: Option<i64>,
    /// 0 = second, 1 = minute, 2 = hour, 3 = day
    pub interval_unit: Option<i32>,
    #[serde(default)]
    pub control_behavior: i32,
    #[serde(default)]
    pub burst: i32,
    pub max_queueing_timeout_ms: Option<i32>,
}

fn default_grade() -> i32 {
    1
}

impl GatewayFlowRuleEntity {
    pub fn new(base: RuleBase, resource: impl Into<String>, count: f64) -> Self {
        GatewayFlowRuleEntity {
            base,
            resource: resource.into(),
            resource_mode: 0,
            grade: default_grade(),
            count,
            interval: Some(1),
            interval_unit: Some(0),
            control_behavior: 0,
            burst: 0,
            max_queueing_timeout_ms: None,
        }
    }
}

impl RuleEntity for GatewayFlowRuleEntity {
    const KIND: RuleKind = RuleKind::Gateway;

    fn base(&self) -> &RuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RuleBase {
        &mut self.base
    }

    fn pre_process(self) -> Option<Self> {
        if is_blank(&self.resource) {
            return None;
        }
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_definition_wire_shape() {
        let api = ApiDefinitionEntity::new(RuleBase::for_app("gw"), "orders-api")
            .with_predicate("/orders/**", 1);
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["apiName"], "orders-api");
        assert_eq!(json["predicateItems"][0]["pattern"], "/orders/**");
        assert_eq!(json["predicateItems"][0]["matchStrategy"], 1);
    }

    #[test]
    fn test_blank_api_name_rejected() {
        let api = ApiDefinitionEntity::new(RuleBase::for_app("gw"), " ");
        assert!(api.pre_process().is_none());
    }
}
