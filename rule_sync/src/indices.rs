//! # Rule Indices Module
//!
//! Three projections of one set of rule entities:
//! - by id
//! - by app (app -> id -> entity)
//! - by machine (machine -> id -> entity)
//!
//! Each projection has its own lock, so readers of one never wait on writers
//! of another. Mutations of the same id are serialized through a striped lock
//! table; there is no index-wide write lock on the mutation path.

use std::collections::HashMap;

use parking_lot::{Mutex, MutexGuard, RwLock};
use rule_model::{MachineInfo, RuleEntity};

const STRIPES: usize = 64;

// ================================================================================================
// RULE INDICES
// ================================================================================================

pub struct RuleIndices<T> {
    by_id: RwLock<HashMap<i64, T>>,
    by_app: RwLock<HashMap<String, HashMap<i64, T>>>,
    by_machine: RwLock<HashMap<MachineInfo, HashMap<i64, T>>>,
    /// Per-id mutation locks, selected by `id mod STRIPES`
    stripes: Vec<Mutex<()>>,
}

impl<T: RuleEntity> Default for RuleIndices<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RuleEntity> RuleIndices<T> {
    /// Creates a new empty index structure
    pub fn new() -> Self {
        RuleIndices {
            by_id: RwLock::new(HashMap::new()),
            by_app: RwLock::new(HashMap::new()),
            by_machine: RwLock::new(HashMap::new()),
            stripes: (0..STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    fn stripe(&self, id: i64) -> MutexGuard<'_, ()> {
        self.stripes[id.rem_euclid(STRIPES as i64) as usize].lock()
    }

    /// Inserts or replaces the entity stored under `id`.
    ///
    /// A replacement whose app or machine changed is moved out of its old
    /// buckets. Returns the previous entity.
    pub fn upsert(&self, id: i64, entity: T) -> Option<T> {
        debug_assert_eq!(entity.id(), Some(id));
        let _guard = self.stripe(id);

        let previous = self.by_id.write().insert(id, entity.clone());
        if let Some(prev) = &previous {
            self.detach(id, prev);
        }

        self.by_app
            .write()
            .entry(entity.app().to_string())
            .or_default()
            .insert(id, entity.clone());
        self.by_machine
            .write()
            .entry(entity.machine())
            .or_default()
            .insert(id, entity);

        previous
    }

    /// Removes an entity from all indices
    pub fn remove(&self, id: i64) -> Option<T> {
        let _guard = self.stripe(id);

        let removed = self.by_id.write().remove(&id)?;
        self.detach(id, &removed);
        Some(removed)
    }

    // Buckets stay in place when they empty out: an existing app bucket means
    // "known locally", which suppresses hydration from the mirror.
    fn detach(&self, id: i64, entity: &T) {
        if let Some(bucket) = self.by_app.write().get_mut(entity.app()) {
            bucket.remove(&id);
        }
        if let Some(bucket) = self.by_machine.write().get_mut(&entity.machine()) {
            bucket.remove(&id);
        }
    }

    /// Clears all indices.
    ///
    /// Takes every stripe first, so no single-entity mutation is half applied.
    pub fn clear(&self) {
        let _guards: Vec<_> = self.stripes.iter().map(|s| s.lock()).collect();
        let mut by_id = self.by_id.write();
        let mut by_app = self.by_app.write();
        let mut by_machine = self.by_machine.write();
        by_id.clear();
        by_app.clear();
        by_machine.clear();
    }

    // ============================================================================================
    // QUERY OPERATIONS
    // ============================================================================================

    pub fn get(&self, id: i64) -> Option<T> {
        self.by_id.read().get(&id).cloned()
    }

    /// Entities of `app` ordered by id, `None` when the app has no bucket
    pub fn by_app(&self, app: &str) -> Option<Vec<T>> {
        self.by_app.read().get(app).map(sorted_values)
    }

    /// Entities indexed under `machine`, ordered by id
    pub fn by_machine(&self, machine: &MachineInfo) -> Vec<T> {
        self.by_machine
            .read()
            .get(machine)
            .map(sorted_values)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.read().is_empty()
    }

    /// Returns statistics about the indices
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entity_count: self.len(),
            app_buckets: self.by_app.read().len(),
            machine_buckets: self.by_machine.read().len(),
        }
    }

    /// Verifies that the three projections describe the same set.
    pub fn check_consistency(&self) -> Result<(), String> {
        let by_id = self.by_id.read();
        let by_app = self.by_app.read();
        let by_machine = self.by_machine.read();

        let app_total: usize = by_app.values().map(HashMap::len).sum();
        let machine_total: usize = by_machine.values().map(HashMap::len).sum();
        if app_total != by_id.len() || machine_total != by_id.len() {
            return Err(format!(
                "size mismatch: {} by id, {} by app, {} by machine",
                by_id.len(),
                app_total,
                machine_total
            ));
        }

        for (id, entity) in by_id.iter() {
            let in_app = by_app.get(entity.app()).and_then(|b| b.get(id));
            if in_app != Some(entity) {
                return Err(format!("rule {} missing from app bucket {}", id, entity.app()));
            }
            let in_machine = by_machine.get(&entity.machine()).and_then(|b| b.get(id));
            if in_machine != Some(entity) {
                return Err(format!("rule {} missing from machine bucket {}", id, entity.machine()));
            }
        }
        Ok(())
    }
}

fn sorted_values<T: Clone>(bucket: &HashMap<i64, T>) -> Vec<T> {
    let mut entries: Vec<(&i64, &T)> = bucket.iter().collect();
    entries.sort_by_key(|(id, _)| **id);
    entries.into_iter().map(|(_, e)| e.clone()).collect()
}

/// Statistics about index usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub entity_count: usize,
    /// Apps with a bucket, including emptied ones
    pub app_buckets: usize,
    pub machine_buckets: usize,
}
