//! Health evaluation
//!
//! Classifies the uniform metric records into trigger / resolve / ignore.
//! The rule is the same for every kind: the collectors already reduced each
//! kind's status to "capacity required" vs "capacity present", so no
//! kind-specific branching happens here.

use tracing::debug;

use crate::models::{dedup_key, AlertAction, AlertEvent, WorkloadMetric};

/// Classified outcome of one run's metrics
#[derive(Debug, Default)]
pub struct Evaluation {
    pub triggers: Vec<AlertEvent>,
    pub resolves: Vec<AlertEvent>,
}

impl Evaluation {
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty() && self.resolves.is_empty()
    }
}

/// Strip a single trailing `-<alphanumeric>` segment if present.
///
/// Generated names carry a template hash suffix (e.g. `api-7f8b9c`);
/// removing it keeps the deduplication identity stable across redeployments
/// that change the suffix. Applied at most once; names without such a
/// segment pass through unchanged.
pub fn normalize_name(name: &str) -> &str {
    match name.rsplit_once('-') {
        Some((stem, suffix))
            if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => name,
    }
}

/// Classify every metric: desired == 0 is silent, available == 0 triggers,
/// anything else resolves.
pub fn evaluate(metrics: Vec<WorkloadMetric>) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for mut metric in metrics {
        // Scaled to zero or suspended: no alert in either direction
        if metric.desired_replicas == 0 {
            debug!(
                namespace = %metric.namespace,
                name = %metric.name,
                kind = %metric.kind,
                "Skipping resource with zero desired capacity"
            );
            continue;
        }

        metric.name = normalize_name(&metric.name).to_string();
        let resource_key = metric.resource_key();

        let action = if metric.available_replicas == 0 {
            AlertAction::Trigger
        } else {
            AlertAction::Resolve
        };

        let event = AlertEvent {
            dedup_key: dedup_key(&resource_key),
            resource_key,
            kind: metric.kind,
            action,
            metric,
        };

        match action {
            AlertAction::Trigger => evaluation.triggers.push(event),
            AlertAction::Resolve => evaluation.resolves.push(event),
        }
    }

    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkloadKind;
    use chrono::Utc;

    fn metric(kind: WorkloadKind, name: &str, desired: i32, available: i32) -> WorkloadMetric {
        WorkloadMetric::new(kind, name, "prod", desired, available, available, Utc::now())
    }

    #[test]
    fn test_normalize_strips_hash_suffix() {
        assert_eq!(normalize_name("api-7f8b9c"), "api");
        assert_eq!(normalize_name("web-5d9c8b7f64"), "web");
    }

    #[test]
    fn test_normalize_leaves_plain_names_unchanged() {
        assert_eq!(normalize_name("api"), "api");
        assert_eq!(normalize_name("api-"), "api-");
        assert_eq!(normalize_name("ingress_gateway"), "ingress_gateway");
    }

    #[test]
    fn test_normalize_strips_one_segment_only() {
        assert_eq!(normalize_name("nginx-ingress-7f8b9c"), "nginx-ingress");
    }

    #[test]
    fn test_normalized_name_is_stable() {
        let once = normalize_name("api-7f8b9c");
        assert_eq!(once, "api");
        assert_eq!(normalize_name(once), "api");
    }

    #[test]
    fn test_zero_desired_is_silent() {
        let evaluation = evaluate(vec![
            metric(WorkloadKind::Deployment, "web", 0, 0),
            metric(WorkloadKind::CronJob, "backup", 0, 0),
        ]);

        assert!(evaluation.is_empty());
    }

    #[test]
    fn test_zero_available_triggers() {
        let evaluation = evaluate(vec![metric(WorkloadKind::Deployment, "web", 3, 0)]);

        assert_eq!(evaluation.triggers.len(), 1);
        assert!(evaluation.resolves.is_empty());

        let event = &evaluation.triggers[0];
        assert_eq!(event.action, AlertAction::Trigger);
        assert_eq!(event.resource_key, "prod/web");
        assert_eq!(event.dedup_key, "k8s-zero-replicas-prod/web");
    }

    #[test]
    fn test_available_capacity_resolves_with_same_key() {
        let evaluation = evaluate(vec![metric(WorkloadKind::StatefulSet, "db", 3, 3)]);

        assert!(evaluation.triggers.is_empty());
        assert_eq!(evaluation.resolves.len(), 1);
        assert_eq!(
            evaluation.resolves[0].dedup_key,
            "k8s-zero-replicas-prod/db"
        );
    }

    #[test]
    fn test_event_carries_normalized_name() {
        let evaluation = evaluate(vec![metric(WorkloadKind::ReplicaSet, "web-7f8b9c", 2, 0)]);

        let event = &evaluation.triggers[0];
        assert_eq!(event.metric.name, "web");
        assert_eq!(event.resource_key, "prod/web");
        assert_eq!(event.dedup_key, "k8s-zero-replicas-prod/web");
    }

    #[test]
    fn test_mixed_batch_is_partitioned() {
        let evaluation = evaluate(vec![
            metric(WorkloadKind::Deployment, "down", 3, 0),
            metric(WorkloadKind::Deployment, "up", 3, 3),
            metric(WorkloadKind::DaemonSet, "ignored", 0, 0),
        ]);

        assert_eq!(evaluation.triggers.len(), 1);
        assert_eq!(evaluation.resolves.len(), 1);
        assert_eq!(evaluation.triggers[0].resource_key, "prod/down");
        assert_eq!(evaluation.resolves[0].resource_key, "prod/up");
    }
}
