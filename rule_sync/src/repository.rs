//! # Rule Repository
//!
//! In-memory store of the rules of one kind, indexed by id, app and machine.
//! When external sync is enabled every mutation is mirrored to the config
//! store and pushed to the app's machines, and the first read of an unknown
//! app hydrates it from the mirror.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use log::{debug, error, info, warn};
use rule_model::{MachineInfo, RuleEntity, RuleKind};

use crate::error::{Result, SyncError};
use crate::indices::{IndexStats, RuleIndices};
use crate::sync::SyncOrchestrator;

// ================================================================================================
// RULE REPOSITORY
// ================================================================================================

pub struct RuleRepository<T: RuleEntity> {
    indices: RuleIndices<T>,
    sync: Arc<SyncOrchestrator>,
    /// Last id issued while sync is disabled
    local_ids: AtomicI64,
}

impl<T: RuleEntity> RuleRepository<T> {
    pub fn new(sync: Arc<SyncOrchestrator>) -> Self {
        RuleRepository {
            indices: RuleIndices::new(),
            sync,
            local_ids: AtomicI64::new(0),
        }
    }

    pub fn kind(&self) -> RuleKind {
        T::KIND
    }

    // ============================================================================================
    // RULE MANAGEMENT
    // ============================================================================================

    /// Saves a rule, assigning an id if it has none.
    ///
    /// Returns the stored (possibly normalized) rule, or `None` when the kind's
    /// pre-processing rejected it.
    pub fn save(&self, entity: T) -> Result<Option<T>> {
        self.save_with(entity, false)
    }

    fn save_with(&self, mut entity: T, bulk: bool) -> Result<Option<T>> {
        if entity.id().is_none() {
            let id = self.next_id(bulk)?;
            entity.set_id(id);
        }

        let Some(derived) = entity.pre_process() else {
            debug!("Pre-processing rejected a {} rule", T::KIND);
            return Ok(None);
        };
        let id = derived
            .id()
            .ok_or_else(|| SyncError::InvalidArgument(format!("{} rule lost its id", T::KIND)))?;

        if !self.sync.is_enabled() {
            self.local_ids.fetch_max(id, Ordering::SeqCst);
        }
        self.indices.upsert(id, derived.clone());
        self.sync_app(derived.app());

        Ok(Some(derived))
    }

    /// Replaces the whole repository content with `entities`.
    ///
    /// This is a reset, not a diff. Ids minted here are persisted once at the
    /// end instead of once per rule. Rules rejected by pre-processing are left
    /// out of the result.
    pub fn save_all(&self, entities: Vec<T>) -> Result<Vec<T>> {
        self.indices.clear();

        let mut saved = Vec::with_capacity(entities.len());
        for entity in entities {
            if let Some(stored) = self.save_with(entity, true)? {
                saved.push(stored);
            }
        }

        if let Some(sequence) = self.sync.sequence() {
            if let Err(e) = sequence.sync_next_id(T::KIND) {
                error!("Failed to persist {} id counter after bulk load: {}", T::KIND, e);
            }
        }
        info!("Loaded {} {} rules", saved.len(), T::KIND);
        Ok(saved)
    }

    /// Deletes a rule; syncs its app only if something was removed
    pub fn delete(&self, id: i64) -> Option<T> {
        let removed = self.indices.remove(id)?;
        self.sync_app(removed.app());
        Some(removed)
    }

    /// Drops every rule without touching the store or the machines
    pub fn clear_all(&self) {
        self.indices.clear();
    }

    // ============================================================================================
    // QUERY OPERATIONS
    // ============================================================================================

    pub fn find_by_id(&self, id: i64) -> Option<T> {
        self.indices.get(id)
    }

    pub fn find_all_by_machine(&self, machine: &MachineInfo) -> Vec<T> {
        self.indices.by_machine(machine)
    }

    /// Rules of `app`, hydrated from the mirror when the app is not known locally.
    ///
    /// Hydration returns the rules as stored, with ids assigned and rejected
    /// rules left out. A failed fetch is logged and yields an empty list.
    pub fn find_all_by_app(&self, app: &str) -> Result<Vec<T>> {
        if app.is_empty() {
            return Err(SyncError::InvalidArgument("app name cannot be empty".to_string()));
        }
        if let Some(rules) = self.indices.by_app(app) {
            return Ok(rules);
        }

        let Some(mirror) = self.sync.mirror() else {
            return Ok(Vec::new());
        };
        let rules = match mirror.fetch::<T>(app) {
            Ok(rules) => rules,
            Err(e) => {
                error!("Failed to hydrate {} rules of {} from the mirror: {}", T::KIND, app, e);
                return Ok(Vec::new());
            }
        };

        if !rules.is_empty() {
            self.sync.counters().record_hydration();
            info!("Hydrating {} {} rules of {} from the mirror", rules.len(), T::KIND, app);
        }
        let mut stored = Vec::with_capacity(rules.len());
        for rule in rules {
            match self.save(rule) {
                Ok(Some(rule)) => stored.push(rule),
                Ok(None) => warn!("Mirrored {} rule of {} rejected by pre-processing", T::KIND, app),
                Err(e) => warn!("Skipping mirrored {} rule of {}: {}", T::KIND, app, e),
            }
        }
        Ok(stored)
    }

    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn index_stats(&self) -> IndexStats {
        self.indices.stats()
    }

    /// Verifies cross-index consistency
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        self.indices.check_consistency()
    }

    // ============================================================================================
    // INTERNALS
    // ============================================================================================

    fn next_id(&self, bulk: bool) -> Result<i64> {
        match self.sync.sequence() {
            Some(sequence) => sequence.next(T::KIND, bulk),
            None => Ok(self.local_ids.fetch_add(1, Ordering::SeqCst) + 1),
        }
    }

    fn sync_app(&self, app: &str) {
        if !self.sync.is_enabled() {
            return;
        }
        let rules = self.indices.by_app(app).unwrap_or_default();
        self.sync.on_mutation(app, &rules);
    }
}

impl<T: RuleEntity> std::fmt::Debug for RuleRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.index_stats();
        f.debug_struct("RuleRepository")
            .field("kind", &T::KIND)
            .field("rule_count", &stats.entity_count)
            .field("app_buckets", &stats.app_buckets)
            .field("sync_enabled", &self.sync.is_enabled())
            .finish()
    }
}
