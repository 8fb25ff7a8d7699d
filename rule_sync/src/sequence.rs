//! # Sequence Generator
//!
//! Mints rule ids per kind across dashboard instances. The last issued id is
//! cached locally and written through to the shared config store so a
//! restarted (or another) instance resumes after it.
//!
//! Each kind owns one mutex guarding its cached value; issuing ids for one kind
//! never blocks another.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use parking_lot::Mutex;
use rule_model::RuleKind;

use crate::error::{Result, SyncError};
use crate::store::{sequence_key, ConfigStore};
use crate::telemetry::SyncStats;

pub struct SequenceGenerator {
    store: Arc<dyn ConfigStore>,
    group: String,
    fetch_timeout: Duration,
    /// Last issued id per kind, `None` until loaded from the store
    slots: [Mutex<Option<i64>>; RuleKind::COUNT],
    stats: Arc<SyncStats>,
}

impl SequenceGenerator {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        group: impl Into<String>,
        fetch_timeout: Duration,
        stats: Arc<SyncStats>,
    ) -> Self {
        SequenceGenerator {
            store,
            group: group.into(),
            fetch_timeout,
            slots: std::array::from_fn(|_| Mutex::new(None)),
            stats,
        }
    }

    /// Issues the next id for `kind`.
    ///
    /// With `suppress_write_back` the new value only lands in the local cache;
    /// bulk loads call [`sync_next_id`](Self::sync_next_id) once afterwards.
    /// A failed write-back is logged and the id is still returned.
    pub fn next(&self, kind: RuleKind, suppress_write_back: bool) -> Result<i64> {
        let mut slot = self.slots[kind.index()].lock();
        let current = match *slot {
            Some(v) => v,
            None => self.load(kind)?,
        };

        let next = current + 1;
        *slot = Some(next);

        if !suppress_write_back {
            self.write_back(kind, next);
        }
        Ok(next)
    }

    /// Persists the cached value for `kind`, loading it first if needed.
    pub fn sync_next_id(&self, kind: RuleKind) -> Result<i64> {
        let mut slot = self.slots[kind.index()].lock();
        let current = match *slot {
            Some(v) => v,
            None => {
                let loaded = self.load(kind)?;
                *slot = Some(loaded);
                loaded
            }
        };
        self.write_back(kind, current);
        Ok(current)
    }

    /// Cached value for `kind`, without touching the store
    pub fn cached(&self, kind: RuleKind) -> Option<i64> {
        *self.slots[kind.index()].lock()
    }

    // Called with the kind's slot locked.
    fn load(&self, kind: RuleKind) -> Result<i64> {
        let key = sequence_key(kind);
        let raw = self
            .store
            .fetch(&key, &self.group, self.fetch_timeout)
            .map_err(|e| {
                error!("Failed to read {} id counter {}: {}", kind, key, e);
                e
            })?;

        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(0),
            Some(value) => value.parse::<i64>().map_err(|_| {
                error!("Id counter {} holds non-numeric value {:?}", key, value);
                SyncError::MalformedState {
                    kind,
                    value: value.to_string(),
                }
            }),
        }
    }

    // Called with the kind's slot locked, so write-backs for one kind are ordered.
    fn write_back(&self, kind: RuleKind, value: i64) {
        let key = sequence_key(kind);
        match self.store.publish(&key, &self.group, &value.to_string()) {
            Ok(true) => debug!("Persisted {} id counter at {}", kind, value),
            Ok(false) => {
                self.stats.record_write_back_failure();
                error!("Store refused {} id counter {} = {}", kind, key, value);
            }
            Err(e) => {
                self.stats.record_write_back_failure();
                error!("Failed to persist {} id counter {} = {}: {}", kind, key, value, e);
            }
        }
    }
}
