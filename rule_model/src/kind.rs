//! # Rule Kinds
//!
//! Closed set of rule categories managed by the dashboard. Each kind carries the
//! suffix used to namespace its entries in the external config store.

use std::fmt;

use serde::{Deserialize, Serialize};

// ================================================================================================
// RULE KIND
// ================================================================================================

/// A category of traffic-control rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    /// Flow control (QPS / thread limiting)
    Flow,
    /// Circuit breaking
    Degrade,
    /// Hot-parameter flow control
    ParamFlow,
    /// Caller allow/deny lists
    Authority,
    /// Whole-system adaptive protection
    System,
    /// Gateway API definitions
    Api,
    /// Gateway flow control
    Gateway,
}

impl RuleKind {
    /// Number of kinds; sizes per-kind tables
    pub const COUNT: usize = 7;

    /// Returns all rule kinds
    pub fn all() -> [RuleKind; RuleKind::COUNT] {
        [
            RuleKind::Flow,
            RuleKind::Degrade,
            RuleKind::ParamFlow,
            RuleKind::Authority,
            RuleKind::System,
            RuleKind::Api,
            RuleKind::Gateway,
        ]
    }

    /// Dense index in `0..COUNT`
    pub fn index(&self) -> usize {
        match self {
            RuleKind::Flow => 0,
            RuleKind::Degrade => 1,
            RuleKind::ParamFlow => 2,
            RuleKind::Authority => 3,
            RuleKind::System => 4,
            RuleKind::Api => 5,
            RuleKind::Gateway => 6,
        }
    }

    /// Store-key suffix, appended to the app name for rule payloads
    pub fn suffix(&self) -> &'static str {
        match self {
            RuleKind::Flow => "-flow-rules",
            RuleKind::Degrade => "-degrade-rules",
            RuleKind::ParamFlow => "-param-rules",
            RuleKind::Authority => "-authority-rules",
            RuleKind::System => "-system-rules",
            RuleKind::Api => "-api-rules",
            RuleKind::Gateway => "-gateway-rules",
        }
    }

    /// Short lowercase name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Flow => "flow",
            RuleKind::Degrade => "degrade",
            RuleKind::ParamFlow => "param-flow",
            RuleKind::Authority => "authority",
            RuleKind::System => "system",
            RuleKind::Api => "api",
            RuleKind::Gateway => "gateway",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_dense_and_unique() {
        let mut seen = [false; RuleKind::COUNT];
        for kind in RuleKind::all() {
            assert!(!seen[kind.index()]);
            seen[kind.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(RuleKind::Flow.suffix(), "-flow-rules");
        assert_eq!(RuleKind::ParamFlow.suffix(), "-param-rules");
        assert_eq!(RuleKind::Gateway.suffix(), "-gateway-rules");
    }
}
