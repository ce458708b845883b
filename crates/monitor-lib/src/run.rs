//! Run orchestration
//!
//! One pass: run every collector, aggregate each per-kind result
//! explicitly, concatenate the metrics, evaluate, dispatch, and tally.
//! Once a pass starts it always completes; only startup configuration can
//! abort the process.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::alert::AlertDispatcher;
use crate::collector::WorkloadCollector;
use crate::evaluator::evaluate;
use crate::models::{AlertAction, WorkloadKind, WorkloadMetric};
use crate::observability::RunLogger;

/// Tally of one completed pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub metrics_collected: usize,
    pub triggers_sent: usize,
    pub resolves_sent: usize,
    pub dispatch_failures: usize,
    /// Kinds whose collector failed this pass
    pub failed_collectors: Vec<WorkloadKind>,
}

/// One monitoring pass over the cluster
pub struct MonitorRun {
    collectors: Vec<Box<dyn WorkloadCollector>>,
    dispatcher: Box<dyn AlertDispatcher>,
    logger: RunLogger,
}

impl MonitorRun {
    pub fn builder() -> MonitorRunBuilder {
        MonitorRunBuilder::new()
    }

    /// Execute the pass and report the tally
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        let mut metrics: Vec<WorkloadMetric> = Vec::new();

        for collector in &self.collectors {
            match collector.collect().await {
                Ok(collected) => metrics.extend(collected),
                Err(error) => {
                    self.logger.log_collector_failure(collector.kind(), &error);
                    report.failed_collectors.push(collector.kind());
                }
            }
        }
        report.metrics_collected = metrics.len();
        info!(collected = report.metrics_collected, "Collected metrics");

        let evaluation = evaluate(metrics);
        for event in evaluation.triggers.iter().chain(evaluation.resolves.iter()) {
            if self.dispatcher.dispatch(event).await {
                match event.action {
                    AlertAction::Trigger => report.triggers_sent += 1,
                    AlertAction::Resolve => report.resolves_sent += 1,
                }
            } else {
                report.dispatch_failures += 1;
            }
        }

        self.logger.log_run_complete(&report);
        report
    }
}

/// Builder for a monitoring pass
pub struct MonitorRunBuilder {
    collectors: Vec<Box<dyn WorkloadCollector>>,
    dispatcher: Option<Box<dyn AlertDispatcher>>,
    logger: RunLogger,
}

impl MonitorRunBuilder {
    pub fn new() -> Self {
        Self {
            collectors: Vec::new(),
            dispatcher: None,
            logger: RunLogger::default(),
        }
    }

    /// Add one collector
    pub fn collector(mut self, collector: Box<dyn WorkloadCollector>) -> Self {
        self.collectors.push(collector);
        self
    }

    /// Add a batch of collectors
    pub fn collectors(mut self, collectors: Vec<Box<dyn WorkloadCollector>>) -> Self {
        self.collectors.extend(collectors);
        self
    }

    /// Set the alert dispatcher
    pub fn dispatcher(mut self, dispatcher: Box<dyn AlertDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Set the run logger
    pub fn logger(mut self, logger: RunLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Result<MonitorRun> {
        if self.collectors.is_empty() {
            anyhow::bail!("At least one collector is required");
        }
        let dispatcher = self
            .dispatcher
            .ok_or_else(|| anyhow::anyhow!("Dispatcher is required"))?;

        Ok(MonitorRun {
            collectors: self.collectors,
            dispatcher,
            logger: self.logger,
        })
    }
}

impl Default for MonitorRunBuilder {
    fn default() -> Self {
        Self::new()
    }
}
