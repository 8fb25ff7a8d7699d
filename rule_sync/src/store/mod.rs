//! # External Config Store
//!
//! Key-value store shared by every dashboard instance: the durable mirror of
//! rule sets and the home of the per-kind id counters.

pub mod memory;
pub mod nacos;

use std::time::Duration;

use rule_model::RuleKind;

use crate::error::Result;

pub use memory::InMemoryConfigStore;
pub use nacos::NacosConfigStore;

/// `(key, group) -> value` store with string values.
pub trait ConfigStore: Send + Sync {
    /// Writes `value`. `Ok(false)` means the store refused the write.
    fn publish(&self, key: &str, group: &str, value: &str) -> Result<bool>;

    /// Reads a value, waiting at most `timeout`. `Ok(None)` means absent.
    fn fetch(&self, key: &str, group: &str, timeout: Duration) -> Result<Option<String>>;
}

/// Key of the rule payload for `app` and `kind`
pub fn rules_key(app: &str, kind: RuleKind) -> String {
    format!("{}{}", app, kind.suffix())
}

/// Key of the id counter for `kind`
pub fn sequence_key(kind: RuleKind) -> String {
    format!("a-custom{}-next-id", kind.suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(rules_key("orderSvc", RuleKind::Flow), "orderSvc-flow-rules");
        assert_eq!(sequence_key(RuleKind::Degrade), "a-custom-degrade-rules-next-id");
    }
}
