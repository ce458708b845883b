//! Workload health monitor
//!
//! Performs one stateless pass over the cluster's watched workloads and
//! pages through PagerDuty when a workload has lost all capacity. Meant to
//! be invoked on a fixed schedule; the next scheduled invocation is the
//! retry mechanism for anything that failed mid-run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use monitor_lib::collector::all_collectors;
use monitor_lib::{MonitorRun, PagerDutyConfig, PagerDutyDispatcher, RunLogger, WatchIndex};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Kubernetes workload health monitor
#[derive(Parser)]
#[command(name = "workload-monitor")]
#[command(author, version, about = "Pages when watched workloads lose all capacity", long_about = None)]
struct Cli {
    /// Watch-list file, used when WATCH_JSON is not set
    #[arg(long, env = "WATCH_FILE")]
    watch_file: Option<PathBuf>,

    /// Log events instead of sending them to PagerDuty
    #[arg(long)]
    dry_run: bool,

    /// Per-request timeout for PagerDuty calls, in seconds
    #[arg(long, env = "MONITOR_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let cli = Cli::parse();

    let logger = RunLogger::default();
    logger.log_startup(MONITOR_VERSION);

    let monitor_config = config::MonitorConfig::load()?;
    monitor_config.validate()?;

    let entries = config::load_watch_entries(
        monitor_config.watch_json.as_deref(),
        cli.watch_file.as_deref(),
    )?;
    let watch = Arc::new(WatchIndex::from_entries(&entries)?);
    info!(entries = entries.len(), "Watch list loaded");

    let client = kube::Client::try_default()
        .await
        .context("Failed to initialize Kubernetes client")?;
    let version = client
        .apiserver_version()
        .await
        .context("Failed to reach the Kubernetes API server")?;
    info!(kubernetes_version = %version.git_version, "Connected to cluster");

    let dispatcher = PagerDutyDispatcher::new(
        PagerDutyConfig::new(monitor_config.routing_key(), monitor_config.api_token())
            .with_timeout(Duration::from_secs(cli.timeout_secs))
            .with_dry_run(cli.dry_run),
    )?;

    let run = MonitorRun::builder()
        .collectors(all_collectors(
            client,
            watch,
            monitor_config.target_namespace(),
        ))
        .dispatcher(Box::new(dispatcher))
        .logger(logger)
        .build()?;

    // Individual collection or dispatch failures are tallied inside the
    // report; a started run always exits zero
    run.run().await;

    Ok(())
}
