//! Observability for monitor runs
//!
//! Structured logging for run lifecycle events with a consistent
//! `event = "..."` field convention, so passes can be queried from log
//! storage without parsing message text.

use tracing::{error, info};

use crate::models::WorkloadKind;
use crate::run::RunReport;

/// Source name reported in logs and alert payloads
pub const MONITOR_SOURCE: &str = "k8s-workload-monitor";

/// Structured logger for run events
#[derive(Debug, Clone)]
pub struct RunLogger {
    source: String,
}

impl Default for RunLogger {
    fn default() -> Self {
        Self::new(MONITOR_SOURCE)
    }
}

impl RunLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Log process startup
    pub fn log_startup(&self, version: &str) {
        info!(
            event = "monitor_started",
            source = %self.source,
            version = %version,
            "Workload monitor started"
        );
    }

    /// Log a per-kind collection failure; the run continues without that
    /// kind's metrics
    pub fn log_collector_failure(&self, kind: WorkloadKind, error: &anyhow::Error) {
        error!(
            event = "collector_failed",
            source = %self.source,
            kind = %kind,
            error = %error,
            "Collector failed, continuing without its metrics"
        );
    }

    /// Log the completed pass tally
    pub fn log_run_complete(&self, report: &RunReport) {
        info!(
            event = "run_complete",
            source = %self.source,
            metrics_collected = report.metrics_collected,
            triggers_sent = report.triggers_sent,
            resolves_sent = report.resolves_sent,
            dispatch_failures = report.dispatch_failures,
            failed_collectors = ?report.failed_collectors,
            "Monitor run complete"
        );
    }
}
