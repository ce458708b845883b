//! ReplicaSet collection
//!
//! ReplicaSets are watched more permissively than the other kinds: an
//! explicit watch entry matches exactly, but any ReplicaSet in a namespace
//! mentioned by the watch list is also in scope. Scaled-to-zero ReplicaSets
//! (old revisions kept around by their Deployment) are skipped entirely.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::ReplicaSet;
use kube::{Api, Client, ResourceExt};
use tracing::info;

use super::{list_params, scoped_api, WorkloadCollector};
use crate::models::{WorkloadKind, WorkloadMetric};
use crate::watch::WatchIndex;

pub struct ReplicaSetCollector {
    client: Client,
    watch: Arc<WatchIndex>,
    target_namespace: Option<String>,
}

impl ReplicaSetCollector {
    pub fn new(client: Client, watch: Arc<WatchIndex>, target_namespace: Option<String>) -> Self {
        Self {
            client,
            watch,
            target_namespace,
        }
    }
}

#[async_trait]
impl WorkloadCollector for ReplicaSetCollector {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::ReplicaSet
    }

    async fn collect(&self) -> Result<Vec<WorkloadMetric>> {
        let api: Api<ReplicaSet> =
            scoped_api(self.client.clone(), self.target_namespace.as_deref());
        let replica_sets = api.list(&list_params()).await?;

        let now = Utc::now();
        let mut metrics = Vec::new();
        for replica_set in &replica_sets.items {
            if let Some(metric) = metric_from_replica_set(replica_set, &self.watch, now) {
                info!(
                    namespace = %metric.namespace,
                    name = %metric.name,
                    available = metric.available_replicas,
                    desired = metric.desired_replicas,
                    "ReplicaSet status collected"
                );
                metrics.push(metric);
            }
        }

        Ok(metrics)
    }
}

/// Map one ReplicaSet to a metric record.
///
/// Returns None when the ReplicaSet is out of scope or has zero desired
/// replicas.
pub fn metric_from_replica_set(
    replica_set: &ReplicaSet,
    watch: &WatchIndex,
    now: DateTime<Utc>,
) -> Option<WorkloadMetric> {
    let name = replica_set.name_any();
    let namespace = replica_set.namespace().unwrap_or_default();
    if !watch.is_watched(WorkloadKind::ReplicaSet.as_str(), &namespace, &name)
        && !watch.covers_namespace(&namespace)
    {
        return None;
    }

    let desired = replica_set
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(0);
    if desired == 0 {
        return None;
    }

    let status = replica_set.status.as_ref();
    let available = status.and_then(|s| s.available_replicas).unwrap_or(0);
    let ready = status.and_then(|s| s.ready_replicas).unwrap_or(0);

    Some(WorkloadMetric::new(
        WorkloadKind::ReplicaSet,
        name,
        namespace,
        desired,
        available,
        ready,
        now,
    ))
}
