//! # Config Mirror
//!
//! Durable copy of each app's rule set in the external config store, one JSON
//! array per `(app, kind)` under the key `{app}{kind suffix}`.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use rule_model::RuleEntity;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SyncError};
use crate::store::{rules_key, ConfigStore};
use crate::telemetry::SyncStats;

// ================================================================================================
// CODEC
// ================================================================================================

/// Serializes a rule list into the blob stored in the mirror
pub fn encode<T: Serialize>(entities: &[T]) -> Result<String> {
    serde_json::to_string(entities).map_err(SyncError::Encode)
}

/// Parses a mirror blob; a blank blob is an empty list
pub fn decode<T: DeserializeOwned>(blob: &str) -> Result<Vec<T>> {
    if blob.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(blob).map_err(SyncError::Decode)
}

// ================================================================================================
// MIRROR
// ================================================================================================

pub struct ConfigMirror {
    store: Arc<dyn ConfigStore>,
    group: String,
    fetch_timeout: Duration,
    stats: Arc<SyncStats>,
}

impl ConfigMirror {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        group: impl Into<String>,
        fetch_timeout: Duration,
        stats: Arc<SyncStats>,
    ) -> Self {
        ConfigMirror {
            store,
            group: group.into(),
            fetch_timeout,
            stats,
        }
    }

    /// Publishes the full rule set of `app`.
    ///
    /// Never fails: errors are logged and counted, and `false` is returned.
    pub fn publish<T: RuleEntity>(&self, app: &str, entities: &[T]) -> bool {
        let key = rules_key(app, T::KIND);
        let outcome = encode(entities).and_then(|blob| self.store.publish(&key, &self.group, &blob));

        let ok = match outcome {
            Ok(true) => {
                info!("Mirrored {} {} rules of {} to {}", entities.len(), T::KIND, app, key);
                true
            }
            Ok(false) => {
                error!("Store refused {} rules of {} under {}", T::KIND, app, key);
                false
            }
            Err(e) => {
                error!("Failed to mirror {} rules of {} under {}: {}", T::KIND, app, key, e);
                false
            }
        };
        self.stats.record_publish(ok);
        ok
    }

    /// Reads the mirrored rule set of `app`.
    ///
    /// Absent or blank blobs yield an empty list; transport and decode failures
    /// are returned to the caller.
    pub fn fetch<T: RuleEntity>(&self, app: &str) -> Result<Vec<T>> {
        let key = rules_key(app, T::KIND);
        let blob = self
            .store
            .fetch(&key, &self.group, self.fetch_timeout)
            .map_err(|e| {
                self.stats.record_fetch_failure();
                e
            })?;

        match blob {
            Some(blob) => {
                let rules = decode(&blob)?;
                info!("Fetched {} {} rules of {} from {}", rules.len(), T::KIND, app, key);
                Ok(rules)
            }
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryConfigStore;
    use rule_model::{
        ApiDefinitionEntity, AuthorityRuleEntity, DegradeRuleEntity, FlowRuleEntity,
        GatewayFlowRuleEntity, ParamFlowRuleEntity, RuleBase, SystemRuleEntity,
    };

    const GROUP: &str = "SENTINEL_GROUP";

    fn mirror(store: &Arc<InMemoryConfigStore>, stats: &Arc<SyncStats>) -> ConfigMirror {
        ConfigMirror::new(
            Arc::clone(store) as Arc<dyn ConfigStore>,
            GROUP,
            Duration::from_secs(3),
            Arc::clone(stats),
        )
    }

    fn flow(id: i64, resource: &str) -> FlowRuleEntity {
        let mut rule = FlowRuleEntity::new(RuleBase::new("orderSvc", "10.0.0.1", 8719), resource, 10.0);
        rule.base.id = Some(id);
        rule
    }

    fn assert_round_trip<T: RuleEntity + std::fmt::Debug>(mut rules: Vec<T>) {
        for (i, rule) in rules.iter_mut().enumerate() {
            rule.set_id(i as i64 + 1);
        }
        let decoded: Vec<T> = decode(&encode(&rules).unwrap()).unwrap();
        assert_eq!(decoded, rules, "{} rules changed in the codec", T::KIND);
    }

    #[test]
    fn test_codec_round_trip_every_kind() {
        let base = || RuleBase::new("orderSvc", "10.0.0.1", 8719);

        assert_round_trip(vec![flow(1, "/a").with_warm_up(5), flow(2, "/b")]);
        assert_round_trip(vec![DegradeRuleEntity::new(base(), "/a", 0, 200.0, 10)]);
        assert_round_trip(vec![ParamFlowRuleEntity::new(base(), "/a", 1, 50.0)]);
        assert_round_trip(vec![
            AuthorityRuleEntity::new(base(), "/a", "appA,appB", AuthorityRuleEntity::WHITE_LIST),
            AuthorityRuleEntity::new(base(), "/b", "appC", AuthorityRuleEntity::BLACK_LIST),
        ]);
        assert_round_trip(vec![
            SystemRuleEntity::new(RuleBase::for_app("orderSvc")).with_qps(500.0),
            SystemRuleEntity::new(RuleBase::for_app("orderSvc")).with_max_thread(64),
        ]);
        assert_round_trip(vec![ApiDefinitionEntity::new(RuleBase::for_app("gw"), "x")
            .with_predicate("/x", 0)
            .with_predicate("/y/**", 1)]);
        assert_round_trip(vec![GatewayFlowRuleEntity::new(base(), "route-a", 20.0)]);
    }

    #[test]
    fn test_decode_blank_is_empty() {
        let rules: Vec<FlowRuleEntity> = decode("  ").unwrap();
        assert!(rules.is_empty());
        assert!(matches!(decode::<FlowRuleEntity>("{oops"), Err(SyncError::Decode(_))));
    }

    #[test]
    fn test_publish_writes_under_app_key() {
        let store = Arc::new(InMemoryConfigStore::new());
        let stats = Arc::new(SyncStats::new());
        let mirror = mirror(&store, &stats);

        assert!(mirror.publish("orderSvc", &[flow(1, "/a")]));

        let writes = store.publishes_for("orderSvc-flow-rules");
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].group, GROUP);
        let back: Vec<FlowRuleEntity> = decode(&writes[0].value).unwrap();
        assert_eq!(back, vec![flow(1, "/a")]);
        assert_eq!(stats.snapshot().mirror_published, 1);
    }

    #[test]
    fn test_publish_failure_is_swallowed_and_counted() {
        let store = Arc::new(InMemoryConfigStore::new());
        let stats = Arc::new(SyncStats::new());
        store.set_fail_publish(true);

        assert!(!mirror(&store, &stats).publish("orderSvc", &[flow(1, "/a")]));
        assert_eq!(stats.snapshot().mirror_publish_failed, 1);
    }

    #[test]
    fn test_fetch_absent_vs_failure() {
        let store = Arc::new(InMemoryConfigStore::new());
        let stats = Arc::new(SyncStats::new());
        let mirror = mirror(&store, &stats);

        let rules: Vec<FlowRuleEntity> = mirror.fetch("nobody").unwrap();
        assert!(rules.is_empty());

        store.set_fail_fetch(true);
        assert!(mirror.fetch::<FlowRuleEntity>("nobody").is_err());
        assert_eq!(stats.snapshot().mirror_fetch_failed, 1);
    }
}
