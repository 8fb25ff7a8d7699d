//! # Fleet Distributor
//!
//! Pushes an app's current rule set to every healthy machine of that app.
//! Delivery is best-effort: each machine succeeds or fails on its own, and
//! nothing is retried. Pushes run on a small tokio runtime owned by the
//! distributor, at most `MAX_CONCURRENT_PUSHES` machines at a time.

pub mod discovery;
pub mod sentinel_client;

use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use rule_model::{MachineInfo, RuleEntity, RuleKind};
use tokio::runtime::Runtime;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::Result;
use crate::mirror::encode;
use crate::telemetry::SyncStats;

pub use discovery::AppRegistry;
pub use sentinel_client::SentinelApiClient;

/// Upper bound on in-flight machine pushes per fan-out
pub const MAX_CONCURRENT_PUSHES: usize = 16;
const PUSH_WORKER_THREADS: usize = 2;

// ================================================================================================
// COLLABORATORS
// ================================================================================================

/// Resolves the machines currently registered for an app
pub trait MachineDiscovery: Send + Sync {
    fn machines_of(&self, app: &str) -> Vec<MachineInfo>;
}

/// Applies an encoded rule set of `kind` to one machine
#[async_trait]
pub trait RuleApplier: Send + Sync {
    async fn apply(&self, app: &str, ip: &str, port: u16, kind: RuleKind, payload: &str) -> Result<()>;
}

// ================================================================================================
// DISTRIBUTOR
// ================================================================================================

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Healthy machines a push was attempted on
    pub attempted: usize,
    pub failed: usize,
    /// Unhealthy machines left out
    pub skipped: usize,
}

pub struct FleetDistributor {
    discovery: Arc<dyn MachineDiscovery>,
    applier: Arc<dyn RuleApplier>,
    stats: Arc<SyncStats>,
    runtime: Runtime,
    permits: Arc<Semaphore>,
}

impl FleetDistributor {
    pub fn new(
        discovery: Arc<dyn MachineDiscovery>,
        applier: Arc<dyn RuleApplier>,
        stats: Arc<SyncStats>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(PUSH_WORKER_THREADS)
            .thread_name("rule-push")
            .enable_all()
            .build()?;

        Ok(FleetDistributor {
            discovery,
            applier,
            stats,
            runtime,
            permits: Arc::new(Semaphore::new(MAX_CONCURRENT_PUSHES)),
        })
    }

    /// Pushes `entities` to every healthy machine of `app`.
    ///
    /// Blocks until every push finished. Must not be called from inside an
    /// async runtime.
    pub fn push<T: RuleEntity>(&self, app: &str, entities: &[T]) -> PushReport {
        if app.trim().is_empty() {
            return PushReport::default();
        }

        let (healthy, unhealthy): (Vec<_>, Vec<_>) = self
            .discovery
            .machines_of(app)
            .into_iter()
            .partition(|m| m.healthy);

        let mut report = PushReport {
            attempted: healthy.len(),
            failed: 0,
            skipped: unhealthy.len(),
        };
        if healthy.is_empty() {
            return report;
        }

        let payload: Arc<str> = match encode(entities) {
            Ok(payload) => payload.into(),
            Err(e) => {
                warn!("Not pushing {} rules of {}: {}", T::KIND, app, e);
                report.failed = healthy.len();
                for _ in &healthy {
                    self.stats.record_push(false);
                }
                return report;
            }
        };

        info!(
            "Pushing {} {} rules of {} to {} machines",
            entities.len(),
            T::KIND,
            app,
            healthy.len()
        );

        report.failed = self.runtime.block_on(self.fan_out(app, healthy, T::KIND, payload));
        report
    }

    /// Runs the pushes and returns how many failed
    async fn fan_out(&self, app: &str, machines: Vec<MachineInfo>, kind: RuleKind, payload: Arc<str>) -> usize {
        let app: Arc<str> = app.into();
        let mut tasks = JoinSet::new();

        for machine in machines {
            let applier = Arc::clone(&self.applier);
            let stats = Arc::clone(&self.stats);
            let permits = Arc::clone(&self.permits);
            let app = Arc::clone(&app);
            let payload = Arc::clone(&payload);
            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok();
                push_one(applier.as_ref(), &stats, &app, &machine, kind, &payload).await
            });
        }

        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => {}
                Ok(false) => failed += 1,
                Err(e) => {
                    warn!("Push task for {} rules of {} aborted: {}", kind, app, e);
                    self.stats.record_push(false);
                    failed += 1;
                }
            }
        }
        failed
    }
}

async fn push_one(
    applier: &dyn RuleApplier,
    stats: &SyncStats,
    app: &str,
    machine: &MachineInfo,
    kind: RuleKind,
    payload: &str,
) -> bool {
    let ok = match applier.apply(app, &machine.ip, machine.port, kind, payload).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Push of {} rules to {} failed: {}", kind, machine, e);
            false
        }
    };
    stats.record_push(ok);
    ok
}
