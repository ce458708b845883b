//! DaemonSet collection
//!
//! DaemonSets have no "available" status field usable for this check, so
//! `status.numberReady` is mapped onto the metric's available slot. The
//! scheduling counters are carried as diagnostics for the alert detail.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::DaemonSet;
use kube::{Api, Client, ResourceExt};
use tracing::info;

use super::{list_params, scoped_api, WorkloadCollector};
use crate::models::{WorkloadKind, WorkloadMetric};
use crate::watch::WatchIndex;

pub struct DaemonSetCollector {
    client: Client,
    watch: Arc<WatchIndex>,
    target_namespace: Option<String>,
}

impl DaemonSetCollector {
    pub fn new(client: Client, watch: Arc<WatchIndex>, target_namespace: Option<String>) -> Self {
        Self {
            client,
            watch,
            target_namespace,
        }
    }
}

#[async_trait]
impl WorkloadCollector for DaemonSetCollector {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::DaemonSet
    }

    async fn collect(&self) -> Result<Vec<WorkloadMetric>> {
        let api: Api<DaemonSet> =
            scoped_api(self.client.clone(), self.target_namespace.as_deref());
        let daemon_sets = api.list(&list_params()).await?;

        let now = Utc::now();
        let mut metrics = Vec::new();
        for daemon_set in &daemon_sets.items {
            if let Some(metric) = metric_from_daemon_set(daemon_set, &self.watch, now) {
                info!(
                    namespace = %metric.namespace,
                    name = %metric.name,
                    ready = metric.ready_replicas,
                    desired = metric.desired_replicas,
                    "DaemonSet status collected"
                );
                metrics.push(metric);
            }
        }

        Ok(metrics)
    }
}

/// Map one DaemonSet to a metric record, or None when it is not watched
pub fn metric_from_daemon_set(
    daemon_set: &DaemonSet,
    watch: &WatchIndex,
    now: DateTime<Utc>,
) -> Option<WorkloadMetric> {
    let name = daemon_set.name_any();
    let namespace = daemon_set.namespace().unwrap_or_default();
    if !watch.is_watched(WorkloadKind::DaemonSet.as_str(), &namespace, &name) {
        return None;
    }

    let status = daemon_set.status.as_ref();
    let desired = status.map(|s| s.desired_number_scheduled).unwrap_or(0);
    let ready = status.map(|s| s.number_ready).unwrap_or(0);
    let current = status.map(|s| s.current_number_scheduled).unwrap_or(0);
    let updated = status
        .and_then(|s| s.updated_number_scheduled)
        .unwrap_or(0);
    let misscheduled = status.map(|s| s.number_misscheduled).unwrap_or(0);

    // ready stands in for available on DaemonSets
    let mut metric = WorkloadMetric::new(
        WorkloadKind::DaemonSet,
        name,
        namespace,
        desired,
        ready,
        ready,
        now,
    );
    metric.current_number_scheduled = Some(current);
    metric.updated_number_scheduled = Some(updated);
    metric.number_misscheduled = Some(misscheduled);
    Some(metric)
}
