//! Monitor configuration
//!
//! Secrets and the watch-list document come from the environment, the way
//! the deployment mounts them. Everything is validated before the first
//! cluster call: a bad configuration is the only way this process exits
//! non-zero.

use std::path::Path;

use anyhow::{Context, Result};
use monitor_lib::{parse_watch_list, WatchEntry};
use serde::Deserialize;
use thiserror::Error;

/// Environment-sourced configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorConfig {
    /// PagerDuty REST API token
    #[serde(default)]
    pub pagerduty_token: Option<String>,

    /// PagerDuty Events v2 routing key
    #[serde(default)]
    pub pagerduty_routing_key: Option<String>,

    /// Inline JSON watch-list document
    #[serde(default)]
    pub watch_json: Option<String>,

    /// Restrict collection to one namespace
    #[serde(default)]
    pub target_namespace: Option<String>,
}

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingSecret(&'static str),

    #[error("no watch list provided, set WATCH_JSON or pass --watch-file")]
    MissingWatchList,
}

impl MonitorConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("Failed to read environment configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Check that both required secrets are present and non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagerduty_token.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::MissingSecret("PAGERDUTY_TOKEN"));
        }
        if self.pagerduty_routing_key.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::MissingSecret("PAGERDUTY_ROUTING_KEY"));
        }
        Ok(())
    }

    pub fn routing_key(&self) -> &str {
        self.pagerduty_routing_key.as_deref().unwrap_or("")
    }

    pub fn api_token(&self) -> &str {
        self.pagerduty_token.as_deref().unwrap_or("")
    }

    /// Namespace restriction, with an empty value meaning no restriction
    pub fn target_namespace(&self) -> Option<String> {
        self.target_namespace
            .as_deref()
            .filter(|namespace| !namespace.is_empty())
            .map(str::to_string)
    }
}

/// Load watch entries from the inline document or a file, preferring the
/// inline form
pub fn load_watch_entries(inline: Option<&str>, file: Option<&Path>) -> Result<Vec<WatchEntry>> {
    let document = match (inline, file) {
        (Some(json), _) => json.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read watch file {}", path.display()))?,
        (None, None) => return Err(ConfigError::MissingWatchList.into()),
    };

    Ok(parse_watch_list(&document)?)
}
