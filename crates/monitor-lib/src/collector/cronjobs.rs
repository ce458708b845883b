//! CronJob collection
//!
//! A schedule's health cannot be read off a replica count. It depends on
//! the outcomes of the Jobs it owns and their pods, so this collector makes
//! two namespace-scoped sub-lookups per watched schedule and encodes the
//! result into the uniform desired/available pair (1/0). Errors in the
//! sub-lookups are logged and contribute zero failures: an infrastructure
//! hiccup in the health check machinery must not page on its own.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client, ResourceExt};
use tracing::{info, warn};

use super::{list_params, scoped_api, WorkloadCollector};
use crate::models::{WorkloadKind, WorkloadMetric};
use crate::watch::WatchIndex;

/// Label set by the Job controller on every pod it creates
const JOB_NAME_LABEL: &str = "job-name";

/// Resolved inputs to the schedule health rule
#[derive(Debug, Clone, Default)]
pub struct CronJobHealth {
    pub suspended: bool,
    pub last_successful_time: Option<DateTime<Utc>>,
    pub failed_jobs: i32,
    pub failed_pods: i32,
}

impl CronJobHealth {
    /// Healthy iff not suspended, succeeded at least once, and no owned Job
    /// or pod reports a failure. A schedule that has never succeeded counts
    /// as unhealthy.
    pub fn is_healthy(&self) -> bool {
        !self.suspended
            && self.last_successful_time.is_some()
            && self.failed_jobs == 0
            && self.failed_pods == 0
    }
}

/// Names of the Jobs owned by the named schedule, plus how many of them
/// report any failed executions. Ownership is an owner reference of kind
/// CronJob with a matching name.
pub fn owned_jobs(cron_job_name: &str, jobs: &[Job]) -> (Vec<String>, i32) {
    let mut names = Vec::new();
    let mut failed = 0;

    for job in jobs {
        let owned = job
            .metadata
            .owner_references
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|reference| reference.kind == "CronJob" && reference.name == cron_job_name);
        if !owned {
            continue;
        }

        names.push(job.name_any());
        if job.status.as_ref().and_then(|s| s.failed).unwrap_or(0) > 0 {
            failed += 1;
        }
    }

    (names, failed)
}

/// Count pods belonging to the given Jobs that sit in a failed or unknown
/// phase. Pods are matched through the `job-name` label.
pub fn count_failed_pods(job_names: &[String], pods: &[Pod]) -> i32 {
    let job_names: HashSet<&str> = job_names.iter().map(String::as_str).collect();
    let mut failed = 0;

    for pod in pods {
        let Some(job) = pod
            .metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(JOB_NAME_LABEL))
        else {
            continue;
        };
        if !job_names.contains(job.as_str()) {
            continue;
        }

        let phase = pod
            .status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            .unwrap_or("");
        if phase.eq_ignore_ascii_case("failed") || phase.eq_ignore_ascii_case("unknown") {
            failed += 1;
        }
    }

    failed
}

/// Map one CronJob plus its resolved health to a metric record
pub fn metric_from_cron_job(
    cron_job: &CronJob,
    health: &CronJobHealth,
    now: DateTime<Utc>,
) -> WorkloadMetric {
    let name = cron_job.name_any();
    let namespace = cron_job.namespace().unwrap_or_default();

    // A suspended schedule is treated as scaled to zero
    let desired = if health.suspended { 0 } else { 1 };
    let available = if health.is_healthy() { 1 } else { 0 };

    let mut metric = WorkloadMetric::new(
        WorkloadKind::CronJob,
        name,
        namespace,
        desired,
        available,
        available,
        now,
    );
    metric.suspended = Some(health.suspended);
    metric.last_successful_time = health.last_successful_time;
    metric.failed_jobs = Some(health.failed_jobs);
    metric.failed_pods = Some(health.failed_pods);
    metric
}

pub struct CronJobCollector {
    client: Client,
    watch: Arc<WatchIndex>,
    target_namespace: Option<String>,
}

impl CronJobCollector {
    pub fn new(client: Client, watch: Arc<WatchIndex>, target_namespace: Option<String>) -> Self {
        Self {
            client,
            watch,
            target_namespace,
        }
    }

    /// Resolve the health inputs for one schedule
    async fn check_health(&self, cron_job: &CronJob, namespace: &str, name: &str) -> CronJobHealth {
        let suspended = cron_job
            .spec
            .as_ref()
            .and_then(|spec| spec.suspend)
            .unwrap_or(false);
        let last_successful_time = cron_job
            .status
            .as_ref()
            .and_then(|status| status.last_successful_time.as_ref())
            .map(|time| time.0);

        let jobs_api: Api<Job> = Api::namespaced(self.client.clone(), namespace);
        let (job_names, failed_jobs) = match jobs_api.list(&list_params()).await {
            Ok(jobs) => owned_jobs(name, &jobs.items),
            Err(error) => {
                warn!(
                    namespace = %namespace,
                    name = %name,
                    error = %error,
                    "Failed to list Jobs for CronJob"
                );
                (Vec::new(), 0)
            }
        };

        let failed_pods = if job_names.is_empty() {
            0
        } else {
            let pods_api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
            match pods_api.list(&list_params()).await {
                Ok(pods) => count_failed_pods(&job_names, &pods.items),
                Err(error) => {
                    warn!(
                        namespace = %namespace,
                        name = %name,
                        error = %error,
                        "Failed to list pods for CronJob"
                    );
                    0
                }
            }
        };

        CronJobHealth {
            suspended,
            last_successful_time,
            failed_jobs,
            failed_pods,
        }
    }
}

#[async_trait]
impl WorkloadCollector for CronJobCollector {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::CronJob
    }

    async fn collect(&self) -> Result<Vec<WorkloadMetric>> {
        let api: Api<CronJob> = scoped_api(self.client.clone(), self.target_namespace.as_deref());
        let cron_jobs = api.list(&list_params()).await?;

        let now = Utc::now();
        let mut metrics = Vec::new();
        for cron_job in &cron_jobs.items {
            let name = cron_job.name_any();
            let namespace = cron_job.namespace().unwrap_or_default();
            if !self
                .watch
                .is_watched(WorkloadKind::CronJob.as_str(), &namespace, &name)
            {
                continue;
            }

            let health = self.check_health(cron_job, &namespace, &name).await;
            let metric = metric_from_cron_job(cron_job, &health, now);
            info!(
                namespace = %metric.namespace,
                name = %metric.name,
                suspended = health.suspended,
                failed_jobs = health.failed_jobs,
                failed_pods = health.failed_pods,
                available = metric.available_replicas,
                "CronJob status collected"
            );
            metrics.push(metric);
        }

        Ok(metrics)
    }
}
