//! In-process config store.
//!
//! Backs single-instance deployments and tests. Keeps the most recent publishes
//! (at most `HISTORY_CAPACITY`) and can be switched into a failing mode to
//! simulate a store outage.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use super::ConfigStore;
use crate::error::{Result, SyncError};

/// Publishes retained by the history; older ones are dropped
pub const HISTORY_CAPACITY: usize = 256;

/// A single recorded publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRecord {
    pub key: String,
    pub group: String,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    entries: RwLock<HashMap<(String, String), String>>,
    history: Mutex<VecDeque<PublishRecord>>,
    fail_publish: AtomicBool,
    fail_fetch: AtomicBool,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a value without recording a publish
    pub fn insert(&self, key: impl Into<String>, group: impl Into<String>, value: impl Into<String>) {
        self.entries
            .write()
            .insert((key.into(), group.into()), value.into());
    }

    /// Current value, ignoring failure modes
    pub fn get(&self, key: &str, group: &str) -> Option<String> {
        self.entries
            .read()
            .get(&(key.to_string(), group.to_string()))
            .cloned()
    }

    /// Retained publishes, oldest first
    pub fn history(&self) -> Vec<PublishRecord> {
        self.history.lock().iter().cloned().collect()
    }

    /// Retained publishes for `key`
    pub fn publishes_for(&self, key: &str) -> Vec<PublishRecord> {
        self.history
            .lock()
            .iter()
            .filter(|r| r.key == key)
            .cloned()
            .collect()
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn publish(&self, key: &str, group: &str, value: &str) -> Result<bool> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(SyncError::Store(format!("publish of {} refused: store offline", key)));
        }
        self.entries
            .write()
            .insert((key.to_string(), group.to_string()), value.to_string());
        let mut history = self.history.lock();
        if history.len() == HISTORY_CAPACITY {
            history.pop_front();
        }
        history.push_back(PublishRecord {
            key: key.to_string(),
            group: group.to_string(),
            value: value.to_string(),
        });
        Ok(true)
    }

    fn fetch(&self, key: &str, group: &str, _timeout: Duration) -> Result<Option<String>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(SyncError::Store(format!("fetch of {} failed: store offline", key)));
        }
        Ok(self.get(key, group))
    }
}
