//! In-process registry of application machines.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use rule_model::MachineInfo;

use super::MachineDiscovery;

/// Machines per app, fed by heartbeats or by the host
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: RwLock<HashMap<String, HashSet<MachineInfo>>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a machine or replaces its health state
    pub fn register(&self, machine: MachineInfo) {
        self.apps
            .write()
            .entry(machine.app.clone())
            .or_default()
            .replace(machine);
    }

    /// Updates the health flag; returns false if the machine is unknown
    pub fn set_health(&self, app: &str, ip: &str, port: u16, healthy: bool) -> bool {
        let key = MachineInfo::new(app, ip, port);
        let mut apps = self.apps.write();
        match apps.get_mut(app) {
            Some(machines) if machines.contains(&key) => {
                machines.replace(key.with_health(healthy));
                true
            }
            _ => false,
        }
    }

    pub fn remove(&self, app: &str, ip: &str, port: u16) -> bool {
        let key = MachineInfo::new(app, ip, port);
        let mut apps = self.apps.write();
        let Some(machines) = apps.get_mut(app) else {
            return false;
        };
        let removed = machines.remove(&key);
        if machines.is_empty() {
            apps.remove(app);
        }
        removed
    }

    /// Registered app names, sorted
    pub fn apps(&self) -> Vec<String> {
        let mut apps: Vec<String> = self.apps.read().keys().cloned().collect();
        apps.sort();
        apps
    }
}

impl MachineDiscovery for AppRegistry {
    fn machines_of(&self, app: &str) -> Vec<MachineInfo> {
        self.apps
            .read()
            .get(app)
            .map(|machines| machines.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_replaces_health() {
        let registry = AppRegistry::new();
        registry.register(MachineInfo::new("a", "10.0.0.1", 1));
        registry.register(MachineInfo::new("a", "10.0.0.1", 1).with_health(false));

        let machines = registry.machines_of("a");
        assert_eq!(machines.len(), 1);
        assert!(!machines[0].healthy);
    }

    #[test]
    fn test_set_health_and_remove() {
        let registry = AppRegistry::new();
        registry.register(MachineInfo::new("a", "10.0.0.1", 1).with_health(false));

        assert!(registry.set_health("a", "10.0.0.1", 1, true));
        assert!(registry.machines_of("a")[0].healthy);
        assert!(!registry.set_health("a", "10.0.0.2", 1, true));

        assert!(registry.remove("a", "10.0.0.1", 1));
        assert!(registry.machines_of("a").is_empty());
        assert!(registry.apps().is_empty());
    }
}
