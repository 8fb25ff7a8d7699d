//! # Rule Sync Library
//!
//! In-memory rule repositories for the dashboard, kept in step with an
//! external config store and pushed to the machines that enforce the rules.

// Core modules
pub mod config;
pub mod error;
pub mod fleet;
pub mod indices;
pub mod mirror;
pub mod repository;
pub mod sequence;
pub mod store;
pub mod stores;
pub mod sync;
pub mod telemetry;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use fleet::{AppRegistry, MachineDiscovery, PushReport, RuleApplier, SentinelApiClient};
pub use repository::RuleRepository;
pub use store::{ConfigStore, InMemoryConfigStore, NacosConfigStore};
pub use stores::RuleStores;
pub use sync::{SyncOrchestrator, SyncOutcome};
pub use telemetry::{SyncStats, SyncStatsSnapshot};
