//! # Rule Entities
//!
//! One entity type per rule kind. Payload fields mirror the JSON the client
//! machines understand; the repositories treat them as opaque.

pub mod authority;
pub mod degrade;
pub mod flow;
pub mod gateway;
pub mod param_flow;
pub mod system;

pub use authority::AuthorityRuleEntity;
pub use degrade::DegradeRuleEntity;
pub use flow::FlowRuleEntity;
pub use gateway::{ApiDefinitionEntity, ApiPredicateItem, GatewayFlowRuleEntity};
pub use param_flow::ParamFlowRuleEntity;
pub use system::SystemRuleEntity;

/// Origin value meaning "any caller"
pub const DEFAULT_LIMIT_APP: &str = "default";

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
