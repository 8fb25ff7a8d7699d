//! # Sync Telemetry
//!
//! Counters for outcomes the repositories swallow: mirror publishes,
//! hydration fetches, sequence write-backs and per-machine pushes. A local
//! edit always looks successful to the caller, so these counters are the only
//! signal separating "fully synchronized" from "locally applied only".

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct SyncStats {
    mirror_published: AtomicU64,
    mirror_publish_failed: AtomicU64,
    mirror_fetch_failed: AtomicU64,
    hydrations: AtomicU64,
    sequence_write_back_failed: AtomicU64,
    machine_push_ok: AtomicU64,
    machine_push_failed: AtomicU64,
}

/// Point-in-time copy of [`SyncStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStatsSnapshot {
    pub mirror_published: u64,
    pub mirror_publish_failed: u64,
    pub mirror_fetch_failed: u64,
    pub hydrations: u64,
    pub sequence_write_back_failed: u64,
    pub machine_push_ok: u64,
    pub machine_push_failed: u64,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_publish(&self, ok: bool) {
        if ok {
            self.mirror_published.fetch_add(1, Ordering::Relaxed);
        } else {
            self.mirror_publish_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_fetch_failure(&self) {
        self.mirror_fetch_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hydration(&self) {
        self.hydrations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write_back_failure(&self) {
        self.sequence_write_back_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_push(&self, ok: bool) {
        if ok {
            self.machine_push_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.machine_push_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            mirror_published: self.mirror_published.load(Ordering::Relaxed),
            mirror_publish_failed: self.mirror_publish_failed.load(Ordering::Relaxed),
            mirror_fetch_failed: self.mirror_fetch_failed.load(Ordering::Relaxed),
            hydrations: self.hydrations.load(Ordering::Relaxed),
            sequence_write_back_failed: self.sequence_write_back_failed.load(Ordering::Relaxed),
            machine_push_ok: self.machine_push_ok.load(Ordering::Relaxed),
            machine_push_failed: self.machine_push_failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_records() {
        let stats = SyncStats::new();
        stats.record_publish(true);
        stats.record_publish(false);
        stats.record_push(false);
        stats.record_push(false);
        stats.record_write_back_failure();

        let snap = stats.snapshot();
        assert_eq!(snap.mirror_published, 1);
        assert_eq!(snap.mirror_publish_failed, 1);
        assert_eq!(snap.machine_push_failed, 2);
        assert_eq!(snap.sequence_write_back_failed, 1);
        assert_eq!(snap.hydrations, 0);
    }
}
