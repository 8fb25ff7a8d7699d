//! # Rule Stores
//!
//! One repository per rule kind, all sharing a single sync orchestrator.

use std::sync::Arc;

use log::info;
use rule_model::{
    ApiDefinitionEntity, AuthorityRuleEntity, DegradeRuleEntity, FlowRuleEntity,
    GatewayFlowRuleEntity, ParamFlowRuleEntity, SystemRuleEntity,
};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::fleet::{MachineDiscovery, SentinelApiClient};
use crate::repository::RuleRepository;
use crate::store::NacosConfigStore;
use crate::sync::SyncOrchestrator;
use crate::telemetry::SyncStatsSnapshot;

pub struct RuleStores {
    pub flow: RuleRepository<FlowRuleEntity>,
    pub degrade: RuleRepository<DegradeRuleEntity>,
    pub param_flow: RuleRepository<ParamFlowRuleEntity>,
    pub authority: RuleRepository<AuthorityRuleEntity>,
    pub system: RuleRepository<SystemRuleEntity>,
    pub api: RuleRepository<ApiDefinitionEntity>,
    pub gateway: RuleRepository<GatewayFlowRuleEntity>,
    sync: Arc<SyncOrchestrator>,
}

impl RuleStores {
    pub fn new(sync: Arc<SyncOrchestrator>) -> Self {
        RuleStores {
            flow: RuleRepository::new(Arc::clone(&sync)),
            degrade: RuleRepository::new(Arc::clone(&sync)),
            param_flow: RuleRepository::new(Arc::clone(&sync)),
            authority: RuleRepository::new(Arc::clone(&sync)),
            system: RuleRepository::new(Arc::clone(&sync)),
            api: RuleRepository::new(Arc::clone(&sync)),
            gateway: RuleRepository::new(Arc::clone(&sync)),
            sync,
        }
    }

    /// Wires the repositories from startup configuration.
    ///
    /// With sync enabled, rules are mirrored to the Nacos server named by
    /// `config` and pushed to machines over their command API.
    pub fn from_config(config: &SyncConfig, discovery: Arc<dyn MachineDiscovery>) -> Result<Self> {
        let sync = if config.enable {
            let store = NacosConfigStore::new(config)?;
            let applier = SentinelApiClient::new(config.push_timeout())?;
            info!(
                "Rule sync enabled: store {} group {}",
                store.base_url(),
                config.group_id
            );
            SyncOrchestrator::enabled(
                Arc::new(store),
                discovery,
                Arc::new(applier),
                &config.group_id,
                config.fetch_timeout(),
            )?
        } else {
            info!("Rule sync disabled, rules stay in memory");
            SyncOrchestrator::disabled()
        };
        Ok(Self::new(Arc::new(sync)))
    }

    pub fn sync(&self) -> &SyncOrchestrator {
        &self.sync
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.sync.stats()
    }

    /// Total rules across all kinds
    pub fn rule_count(&self) -> usize {
        self.flow.count()
            + self.degrade.count()
            + self.param_flow.count()
            + self.authority.count()
            + self.system.count()
            + self.api.count()
            + self.gateway.count()
    }

    /// Drops every rule of every kind, locally only
    pub fn clear_all(&self) {
        self.flow.clear_all();
        self.degrade.clear_all();
        self.param_flow.clear_all();
        self.authority.clear_all();
        self.system.clear_all();
        self.api.clear_all();
        self.gateway.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::{AppRegistry, RuleApplier};
    use crate::store::{rules_key, sequence_key, ConfigStore, InMemoryConfigStore};
    use crate::test_support::RecordingApplier;
    use rule_model::{MachineInfo, RuleBase, RuleKind};
    use std::time::Duration;

    #[test]
    fn test_from_config_disabled() {
        let stores = RuleStores::from_config(&SyncConfig::default(), Arc::new(AppRegistry::new())).unwrap();
        assert!(!stores.sync().is_enabled());

        stores
            .flow
            .save(FlowRuleEntity::new(RuleBase::for_app("a"), "/r", 1.0))
            .unwrap();
        assert_eq!(stores.rule_count(), 1);
        assert_eq!(stores.stats().mirror_published, 0);
    }

    #[test]
    fn test_from_config_enabled_builds_remote_sync() {
        let config = SyncConfig {
            enable: true,
            ..SyncConfig::default()
        };
        let stores = RuleStores::from_config(&config, Arc::new(AppRegistry::new())).unwrap();
        assert!(stores.sync().is_enabled());
        assert!(stores.sync().sequence().is_some());
    }

    #[test]
    fn test_kinds_use_separate_keys_and_counters() {
        let store = Arc::new(InMemoryConfigStore::new());
        let registry = Arc::new(AppRegistry::new());
        registry.register(MachineInfo::new("a", "10.0.0.1", 8719));
        let applier = Arc::new(RecordingApplier::new());
        let sync = SyncOrchestrator::enabled(
            Arc::clone(&store) as Arc<dyn ConfigStore>,
            registry,
            Arc::clone(&applier) as Arc<dyn RuleApplier>,
            "G",
            Duration::from_secs(1),
        )
        .unwrap();
        let stores = RuleStores::new(Arc::new(sync));

        let flow = stores
            .flow
            .save(FlowRuleEntity::new(RuleBase::for_app("a"), "/r", 1.0))
            .unwrap()
            .unwrap();
        let system = stores
            .system
            .save(SystemRuleEntity::new(RuleBase::for_app("a")).with_qps(100.0))
            .unwrap()
            .unwrap();

        assert_eq!(flow.base.id, Some(1));
        assert_eq!(system.base.id, Some(1));
        assert!(store.get(&rules_key("a", RuleKind::Flow), "G").is_some());
        assert!(store.get(&rules_key("a", RuleKind::System), "G").is_some());
        assert_eq!(store.get(&sequence_key(RuleKind::System), "G").as_deref(), Some("1"));

        let kinds: Vec<RuleKind> = applier.calls().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![RuleKind::Flow, RuleKind::System]);
    }

    #[test]
    fn test_clear_all_empties_every_kind() {
        let stores = RuleStores::new(Arc::new(SyncOrchestrator::disabled()));
        stores
            .flow
            .save(FlowRuleEntity::new(RuleBase::for_app("a"), "/r", 1.0))
            .unwrap();
        stores
            .system
            .save(SystemRuleEntity::new(RuleBase::for_app("a")).with_max_thread(10))
            .unwrap();

        stores.clear_all();
        assert_eq!(stores.rule_count(), 0);
    }
}
