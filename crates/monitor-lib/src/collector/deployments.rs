//! Deployment collection

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Api, Client, ResourceExt};
use tracing::info;

use super::{list_params, scoped_api, WorkloadCollector};
use crate::models::{WorkloadKind, WorkloadMetric};
use crate::watch::WatchIndex;

pub struct DeploymentCollector {
    client: Client,
    watch: Arc<WatchIndex>,
    target_namespace: Option<String>,
}

impl DeploymentCollector {
    pub fn new(client: Client, watch: Arc<WatchIndex>, target_namespace: Option<String>) -> Self {
        Self {
            client,
            watch,
            target_namespace,
        }
    }
}

#[async_trait]
impl WorkloadCollector for DeploymentCollector {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Deployment
    }

    async fn collect(&self) -> Result<Vec<WorkloadMetric>> {
        let api: Api<Deployment> =
            scoped_api(self.client.clone(), self.target_namespace.as_deref());
        let deployments = api.list(&list_params()).await?;

        let now = Utc::now();
        let mut metrics = Vec::new();
        for deployment in &deployments.items {
            if let Some(metric) = metric_from_deployment(deployment, &self.watch, now) {
                info!(
                    namespace = %metric.namespace,
                    name = %metric.name,
                    available = metric.available_replicas,
                    desired = metric.desired_replicas,
                    "Deployment status collected"
                );
                metrics.push(metric);
            }
        }

        Ok(metrics)
    }
}

/// Map one Deployment to a metric record, or None when it is not watched
pub fn metric_from_deployment(
    deployment: &Deployment,
    watch: &WatchIndex,
    now: DateTime<Utc>,
) -> Option<WorkloadMetric> {
    let name = deployment.name_any();
    let namespace = deployment.namespace().unwrap_or_default();
    if !watch.is_watched(WorkloadKind::Deployment.as_str(), &namespace, &name) {
        return None;
    }

    let desired = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(0);
    let status = deployment.status.as_ref();
    let available = status.and_then(|s| s.available_replicas).unwrap_or(0);
    let ready = status.and_then(|s| s.ready_replicas).unwrap_or(0);

    Some(WorkloadMetric::new(
        WorkloadKind::Deployment,
        name,
        namespace,
        desired,
        available,
        ready,
        now,
    ))
}
