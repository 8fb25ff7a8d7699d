//! # Sync Orchestrator
//!
//! Runs after every mutating repository call: mirror the app's full rule set to
//! the config store, then push it to the app's healthy machines. A failed
//! mirror does not stop the push.

use std::sync::Arc;
use std::time::Duration;

use rule_model::RuleEntity;

use crate::error::Result;
use crate::fleet::{FleetDistributor, MachineDiscovery, PushReport, RuleApplier};
use crate::mirror::ConfigMirror;
use crate::sequence::SequenceGenerator;
use crate::store::ConfigStore;
use crate::telemetry::{SyncStats, SyncStatsSnapshot};

/// Result of one synchronization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub mirrored: bool,
    pub pushed: PushReport,
}

struct RemoteSync {
    sequence: SequenceGenerator,
    mirror: ConfigMirror,
    distributor: FleetDistributor,
}

pub struct SyncOrchestrator {
    /// `None` when external sync is disabled
    remote: Option<RemoteSync>,
    stats: Arc<SyncStats>,
}

impl SyncOrchestrator {
    /// Local-only mode: ids come from a process counter and nothing leaves the process
    pub fn disabled() -> Self {
        SyncOrchestrator {
            remote: None,
            stats: Arc::new(SyncStats::new()),
        }
    }

    pub fn enabled(
        store: Arc<dyn ConfigStore>,
        discovery: Arc<dyn MachineDiscovery>,
        applier: Arc<dyn RuleApplier>,
        group: &str,
        fetch_timeout: Duration,
    ) -> Result<Self> {
        let stats = Arc::new(SyncStats::new());
        let remote = RemoteSync {
            sequence: SequenceGenerator::new(Arc::clone(&store), group, fetch_timeout, Arc::clone(&stats)),
            mirror: ConfigMirror::new(store, group, fetch_timeout, Arc::clone(&stats)),
            distributor: FleetDistributor::new(discovery, applier, Arc::clone(&stats))?,
        };
        Ok(SyncOrchestrator {
            remote: Some(remote),
            stats,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.remote.is_some()
    }

    pub fn sequence(&self) -> Option<&SequenceGenerator> {
        self.remote.as_ref().map(|r| &r.sequence)
    }

    pub fn mirror(&self) -> Option<&ConfigMirror> {
        self.remote.as_ref().map(|r| &r.mirror)
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn counters(&self) -> &SyncStats {
        &self.stats
    }

    /// Mirrors then pushes `entities`, the full current rule set of `app`.
    ///
    /// Returns `None` when sync is disabled.
    pub fn on_mutation<T: RuleEntity>(&self, app: &str, entities: &[T]) -> Option<SyncOutcome> {
        let remote = self.remote.as_ref()?;
        let mirrored = remote.mirror.publish(app, entities);
        let pushed = remote.distributor.push(app, entities);
        Some(SyncOutcome { mirrored, pushed })
    }
}
