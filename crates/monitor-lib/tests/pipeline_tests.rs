//! End-to-end pipeline tests: cluster objects in, alert events out

use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use monitor_lib::collector::{async_trait, metric_from_deployment, WorkloadCollector};
use monitor_lib::{
    parse_watch_list, AlertAction, AlertDispatcher, AlertEvent, MonitorRun, WatchIndex,
    WorkloadKind, WorkloadMetric,
};

fn deployment(namespace: &str, name: &str, desired: i32, available: i32) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(desired),
            ..Default::default()
        }),
        status: Some(DeploymentStatus {
            available_replicas: Some(available),
            ready_replicas: Some(available),
            ..Default::default()
        }),
    }
}

/// Collector mapping a fixed set of Deployment objects, standing in for the
/// cluster listing
struct FixtureCollector {
    watch: Arc<WatchIndex>,
    deployments: Vec<Deployment>,
}

#[async_trait]
impl WorkloadCollector for FixtureCollector {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Deployment
    }

    async fn collect(&self) -> Result<Vec<WorkloadMetric>> {
        let now = Utc::now();
        Ok(self
            .deployments
            .iter()
            .filter_map(|d| metric_from_deployment(d, &self.watch, now))
            .collect())
    }
}

/// Collector standing in for a kind whose listing fails
struct BrokenCollector;

#[async_trait]
impl WorkloadCollector for BrokenCollector {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::DaemonSet
    }

    async fn collect(&self) -> Result<Vec<WorkloadMetric>> {
        anyhow::bail!("apiserver timeout")
    }
}

struct RecordingDispatcher {
    seen: Arc<Mutex<Vec<(String, AlertAction)>>>,
}

#[async_trait]
impl AlertDispatcher for RecordingDispatcher {
    async fn dispatch(&self, event: &AlertEvent) -> bool {
        self.seen
            .lock()
            .unwrap()
            .push((event.dedup_key.clone(), event.action));
        true
    }
}

#[tokio::test]
async fn test_zero_available_watched_deployment_pages_once() {
    let entries =
        parse_watch_list(r#"[{"namespace": "prod", "name": "web", "kind": "deployment"}]"#)
            .unwrap();
    let watch = Arc::new(WatchIndex::from_entries(&entries).unwrap());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let run = MonitorRun::builder()
        .collector(Box::new(FixtureCollector {
            watch,
            deployments: vec![
                deployment("prod", "web", 3, 0),
                // not watched, must stay silent
                deployment("staging", "web", 3, 0),
            ],
        }))
        .dispatcher(Box::new(RecordingDispatcher { seen: seen.clone() }))
        .build()
        .unwrap();

    let report = run.run().await;

    assert_eq!(report.metrics_collected, 1);
    assert_eq!(report.triggers_sent, 1);
    assert_eq!(report.resolves_sent, 0);

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![(
            "k8s-zero-replicas-prod/web".to_string(),
            AlertAction::Trigger
        )]
    );
}

#[tokio::test]
async fn test_broken_collector_leaves_other_kinds_alerting() {
    let entries = parse_watch_list(
        r#"[
            {"namespace": "prod", "name": "web-7f8b9c", "kind": "deployment"},
            {"namespace": "prod", "name": "agent", "kind": "daemonset"}
        ]"#,
    )
    .unwrap();
    let watch = Arc::new(WatchIndex::from_entries(&entries).unwrap());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let run = MonitorRun::builder()
        .collector(Box::new(FixtureCollector {
            watch,
            deployments: vec![deployment("prod", "web-7f8b9c", 2, 0)],
        }))
        .collector(Box::new(BrokenCollector))
        .dispatcher(Box::new(RecordingDispatcher { seen: seen.clone() }))
        .build()
        .unwrap();

    let report = run.run().await;

    assert_eq!(report.failed_collectors, vec![WorkloadKind::DaemonSet]);
    assert_eq!(report.triggers_sent, 1);

    // The generated-name suffix is stripped before the key is derived
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].0, "k8s-zero-replicas-prod/web");
}

#[tokio::test]
async fn test_recovered_deployment_resolves_under_the_same_key() {
    let entries =
        parse_watch_list(r#"[{"namespace": "prod", "name": "web", "kind": "deployment"}]"#)
            .unwrap();
    let watch = Arc::new(WatchIndex::from_entries(&entries).unwrap());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let run = MonitorRun::builder()
        .collector(Box::new(FixtureCollector {
            watch,
            deployments: vec![deployment("prod", "web", 3, 2)],
        }))
        .dispatcher(Box::new(RecordingDispatcher { seen: seen.clone() }))
        .build()
        .unwrap();

    let report = run.run().await;

    assert_eq!(report.triggers_sent, 0);
    assert_eq!(report.resolves_sent, 1);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            "k8s-zero-replicas-prod/web".to_string(),
            AlertAction::Resolve
        )]
    );
}
