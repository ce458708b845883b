//! Monitor library for Kubernetes workload health
//!
//! This crate provides the core functionality for:
//! - Collecting replica/health metrics for watched workloads
//! - Classifying each workload as trigger/resolve/ignore
//! - Emitting deduplicated events to PagerDuty
//! - Run orchestration and reporting

pub mod alert;
pub mod collector;
pub mod evaluator;
pub mod models;
pub mod observability;
pub mod run;
pub mod watch;

pub use alert::{AlertDispatcher, PagerDutyConfig, PagerDutyDispatcher};
pub use evaluator::{evaluate, normalize_name, Evaluation};
pub use models::*;
pub use observability::RunLogger;
pub use run::{MonitorRun, MonitorRunBuilder, RunReport};
pub use watch::{parse_watch_list, WatchEntry, WatchError, WatchIndex};
