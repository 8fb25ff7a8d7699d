//! # Rule Model
//!
//! Data model shared by the rule repositories: rule kinds, machine identities
//! and the rule entities of every kind.

pub mod entities;
pub mod entity;
pub mod kind;
pub mod machine;

// Re-export commonly used types
pub use entities::{
    ApiDefinitionEntity, ApiPredicateItem, AuthorityRuleEntity, DegradeRuleEntity, FlowRuleEntity,
    GatewayFlowRuleEntity, ParamFlowRuleEntity, SystemRuleEntity,
};
pub use entity::{now_millis, RuleBase, RuleEntity};
pub use kind::RuleKind;
pub use machine::MachineInfo;
