//! Workload metric collection
//!
//! One collector per workload kind. Each lists its kind through the cluster
//! API, filters through the shared [`WatchIndex`], and normalizes status
//! into the uniform [`WorkloadMetric`] record. Collection errors stay inside
//! each collector's `Result`; the run orchestrator decides what a per-kind
//! failure means for the rest of the run.

mod cronjobs;
mod daemonsets;
mod deployments;
mod replicasets;
mod statefulsets;

pub use cronjobs::{
    count_failed_pods, metric_from_cron_job, owned_jobs, CronJobCollector, CronJobHealth,
};
pub use daemonsets::{metric_from_daemon_set, DaemonSetCollector};
pub use deployments::{metric_from_deployment, DeploymentCollector};
pub use replicasets::{metric_from_replica_set, ReplicaSetCollector};
pub use statefulsets::{metric_from_stateful_set, StatefulSetCollector};

use std::sync::Arc;

use anyhow::Result;
use k8s_openapi::NamespaceResourceScope;
use kube::api::ListParams;
use kube::{Api, Client};

use crate::models::{WorkloadKind, WorkloadMetric};
use crate::watch::WatchIndex;

pub use async_trait::async_trait;

/// Upper bound on any single list call, in seconds
pub const LIST_TIMEOUT_SECS: u32 = 30;

/// Trait for per-kind metric collection
#[async_trait]
pub trait WorkloadCollector: Send + Sync {
    /// Kind this collector reports on
    fn kind(&self) -> WorkloadKind;

    /// List the kind and normalize every watched resource into a metric
    async fn collect(&self) -> Result<Vec<WorkloadMetric>>;
}

/// Create one collector per supported kind, sharing the client and index
pub fn all_collectors(
    client: Client,
    watch: Arc<WatchIndex>,
    target_namespace: Option<String>,
) -> Vec<Box<dyn WorkloadCollector>> {
    vec![
        Box::new(DeploymentCollector::new(
            client.clone(),
            watch.clone(),
            target_namespace.clone(),
        )),
        Box::new(ReplicaSetCollector::new(
            client.clone(),
            watch.clone(),
            target_namespace.clone(),
        )),
        Box::new(DaemonSetCollector::new(
            client.clone(),
            watch.clone(),
            target_namespace.clone(),
        )),
        Box::new(StatefulSetCollector::new(
            client.clone(),
            watch.clone(),
            target_namespace.clone(),
        )),
        Box::new(CronJobCollector::new(client, watch, target_namespace)),
    ]
}

pub(crate) fn list_params() -> ListParams {
    ListParams::default().timeout(LIST_TIMEOUT_SECS)
}

/// All-namespaces Api, or a namespaced one when a target restriction is set
pub(crate) fn scoped_api<K>(client: Client, target_namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = NamespaceResourceScope>,
    <K as kube::Resource>::DynamicType: Default,
{
    match target_namespace {
        Some(namespace) => Api::namespaced(client, namespace),
        None => Api::all(client),
    }
}
