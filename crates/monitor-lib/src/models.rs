//! Core data models for the workload monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix shared by the trigger and resolve events of one resource, so the
/// alerting side can correlate them across independent runs.
pub const DEDUP_KEY_PREFIX: &str = "k8s-zero-replicas-";

/// Build the deduplication key for a `<namespace>/<name>` resource key.
pub fn dedup_key(resource_key: &str) -> String {
    format!("{DEDUP_KEY_PREFIX}{resource_key}")
}

/// Workload kinds covered by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    Deployment,
    ReplicaSet,
    DaemonSet,
    StatefulSet,
    CronJob,
}

impl WorkloadKind {
    /// Lowercase form used in watch-list lookups and event payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "deployment",
            WorkloadKind::ReplicaSet => "replicaset",
            WorkloadKind::DaemonSet => "daemonset",
            WorkloadKind::StatefulSet => "statefulset",
            WorkloadKind::CronJob => "cronjob",
        }
    }
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform health record produced by every collector
///
/// `desired_replicas` is the capacity the workload's spec requests and
/// `available_replicas` the capacity currently confirmed usable under this
/// monitor's per-kind mapping: DaemonSets report `status.numberReady` and
/// StatefulSets `status.readyReplicas` here, not the API server's own
/// "available" field. CronJobs encode schedule health as 0/1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadMetric {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub kind: WorkloadKind,
    pub desired_replicas: i32,
    pub available_replicas: i32,
    pub ready_replicas: i32,
    pub timestamp: DateTime<Utc>,

    // DaemonSet diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_number_scheduled: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_number_scheduled: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_misscheduled: Option<i32>,

    // StatefulSet diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_replicas: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_replicas: Option<i32>,

    // CronJob diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_jobs: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_pods: Option<i32>,
}

impl WorkloadMetric {
    /// Create a metric with the common fields set and no kind-specific extras
    pub fn new(
        kind: WorkloadKind,
        name: impl Into<String>,
        namespace: impl Into<String>,
        desired_replicas: i32,
        available_replicas: i32,
        ready_replicas: i32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            kind,
            desired_replicas,
            available_replicas,
            ready_replicas,
            timestamp,
            current_number_scheduled: None,
            updated_number_scheduled: None,
            number_misscheduled: None,
            current_replicas: None,
            updated_replicas: None,
            suspended: None,
            last_successful_time: None,
            failed_jobs: None,
            failed_pods: None,
        }
    }

    /// `<namespace>/<name>` identity used in alert payloads
    pub fn resource_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Direction of an alert event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertAction {
    Trigger,
    Resolve,
}

impl std::fmt::Display for AlertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertAction::Trigger => f.write_str("trigger"),
            AlertAction::Resolve => f.write_str("resolve"),
        }
    }
}

/// One unhealthy-or-recovered resource in one run
#[derive(Debug, Clone, Serialize)]
pub struct AlertEvent {
    pub resource_key: String,
    pub kind: WorkloadKind,
    pub dedup_key: String,
    pub action: AlertAction,
    pub metric: WorkloadMetric,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_format() {
        assert_eq!(dedup_key("prod/web"), "k8s-zero-replicas-prod/web");
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WorkloadKind::ReplicaSet).unwrap(),
            "\"replicaset\""
        );
        assert_eq!(WorkloadKind::CronJob.as_str(), "cronjob");
    }

    #[test]
    fn test_metric_detail_carries_only_its_own_fields() {
        let metric = WorkloadMetric::new(
            WorkloadKind::Deployment,
            "web",
            "prod",
            3,
            0,
            0,
            Utc::now(),
        );

        let value = serde_json::to_value(&metric).unwrap();
        assert_eq!(value["type"], "deployment");
        assert_eq!(value["desired_replicas"], 3);
        assert!(value.get("current_number_scheduled").is_none());
        assert!(value.get("failed_jobs").is_none());
    }
}
