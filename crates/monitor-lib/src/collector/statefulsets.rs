//! StatefulSet collection
//!
//! Like DaemonSets, StatefulSets report readiness rather than availability
//! for this check: `status.readyReplicas` is mapped onto the available slot.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::StatefulSet;
use kube::{Api, Client, ResourceExt};
use tracing::info;

use super::{list_params, scoped_api, WorkloadCollector};
use crate::models::{WorkloadKind, WorkloadMetric};
use crate::watch::WatchIndex;

pub struct StatefulSetCollector {
    client: Client,
    watch: Arc<WatchIndex>,
    target_namespace: Option<String>,
}

impl StatefulSetCollector {
    pub fn new(client: Client, watch: Arc<WatchIndex>, target_namespace: Option<String>) -> Self {
        Self {
            client,
            watch,
            target_namespace,
        }
    }
}

#[async_trait]
impl WorkloadCollector for StatefulSetCollector {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::StatefulSet
    }

    async fn collect(&self) -> Result<Vec<WorkloadMetric>> {
        let api: Api<StatefulSet> =
            scoped_api(self.client.clone(), self.target_namespace.as_deref());
        let stateful_sets = api.list(&list_params()).await?;

        let now = Utc::now();
        let mut metrics = Vec::new();
        for stateful_set in &stateful_sets.items {
            if let Some(metric) = metric_from_stateful_set(stateful_set, &self.watch, now) {
                info!(
                    namespace = %metric.namespace,
                    name = %metric.name,
                    ready = metric.ready_replicas,
                    desired = metric.desired_replicas,
                    "StatefulSet status collected"
                );
                metrics.push(metric);
            }
        }

        Ok(metrics)
    }
}

/// Map one StatefulSet to a metric record, or None when it is not watched
pub fn metric_from_stateful_set(
    stateful_set: &StatefulSet,
    watch: &WatchIndex,
    now: DateTime<Utc>,
) -> Option<WorkloadMetric> {
    let name = stateful_set.name_any();
    let namespace = stateful_set.namespace().unwrap_or_default();
    if !watch.is_watched(WorkloadKind::StatefulSet.as_str(), &namespace, &name) {
        return None;
    }

    let desired = stateful_set
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(0);
    let status = stateful_set.status.as_ref();
    let ready = status.and_then(|s| s.ready_replicas).unwrap_or(0);
    let current = status.and_then(|s| s.current_replicas).unwrap_or(0);
    let updated = status.and_then(|s| s.updated_replicas).unwrap_or(0);

    // ready stands in for available on StatefulSets
    let mut metric = WorkloadMetric::new(
        WorkloadKind::StatefulSet,
        name,
        namespace,
        desired,
        ready,
        ready,
        now,
    );
    metric.current_replicas = Some(current);
    metric.updated_replicas = Some(updated);
    Some(metric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::WatchEntry;
    use k8s_openapi::api::apps::v1::{StatefulSetSpec, StatefulSetStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn watch(namespace: &str, name: &str) -> WatchIndex {
        WatchIndex::from_entries(&[WatchEntry {
            kind: "statefulset".to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }])
        .unwrap()
    }

    #[test]
    fn test_ready_maps_to_available() {
        let stateful_set = StatefulSet {
            metadata: ObjectMeta {
                name: Some("db".to_string()),
                namespace: Some("prod".to_string()),
                ..Default::default()
            },
            spec: Some(StatefulSetSpec {
                replicas: Some(3),
                ..Default::default()
            }),
            status: Some(StatefulSetStatus {
                ready_replicas: Some(2),
                current_replicas: Some(3),
                updated_replicas: Some(1),
                replicas: 3,
                ..Default::default()
            }),
        };

        let metric =
            metric_from_stateful_set(&stateful_set, &watch("prod", "db"), Utc::now()).unwrap();

        assert_eq!(metric.desired_replicas, 3);
        assert_eq!(metric.available_replicas, 2);
        assert_eq!(metric.ready_replicas, 2);
        assert_eq!(metric.current_replicas, Some(3));
        assert_eq!(metric.updated_replicas, Some(1));
    }

    #[test]
    fn test_unwatched_stateful_set_is_skipped() {
        let stateful_set = StatefulSet {
            metadata: ObjectMeta {
                name: Some("other".to_string()),
                namespace: Some("prod".to_string()),
                ..Default::default()
            },
            spec: None,
            status: None,
        };

        assert!(
            metric_from_stateful_set(&stateful_set, &watch("prod", "db"), Utc::now()).is_none()
        );
    }
}
