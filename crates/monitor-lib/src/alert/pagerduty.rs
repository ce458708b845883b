//! PagerDuty Events v2 dispatcher
//!
//! Trigger and resolve events for one resource share a deterministic
//! deduplication key, which is what lets PagerDuty correlate a later
//! resolve with an earlier trigger across independent runs.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};
use url::Url;

use super::AlertDispatcher;
use crate::models::{AlertAction, AlertEvent, WorkloadMetric};

/// Public Events v2 enqueue endpoint
pub const DEFAULT_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

const SEVERITY: &str = "critical";
const SOURCE: &str = crate::observability::MONITOR_SOURCE;
const GROUP: &str = "kubernetes";
const CLASS: &str = "replica_failure";

/// Configuration for the PagerDuty dispatcher
#[derive(Debug, Clone)]
pub struct PagerDutyConfig {
    /// Events v2 integration routing key
    pub routing_key: String,
    /// REST API token. Required by the deployment's secret contract; the
    /// events endpoint itself authenticates through the routing key.
    pub api_token: String,
    /// Enqueue endpoint, overridable for tests
    pub events_url: Url,
    /// Upper bound on one send
    pub timeout: Duration,
    /// Log events instead of sending them
    pub dry_run: bool,
}

impl PagerDutyConfig {
    pub fn new(routing_key: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            routing_key: routing_key.into(),
            api_token: api_token.into(),
            events_url: Url::parse(DEFAULT_EVENTS_URL).expect("default events URL is valid"),
            timeout: Duration::from_secs(30),
            dry_run: false,
        }
    }

    pub fn with_events_url(mut self, events_url: Url) -> Self {
        self.events_url = events_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Events v2 enqueue body
#[derive(Debug, Serialize)]
struct EnqueueRequest<'a> {
    routing_key: &'a str,
    event_action: AlertAction,
    dedup_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<EventPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct EventPayload<'a> {
    summary: String,
    severity: &'a str,
    source: &'a str,
    component: &'a str,
    group: &'a str,
    class: &'a str,
    custom_details: &'a WorkloadMetric,
}

/// Dispatcher posting to the Events v2 endpoint
pub struct PagerDutyDispatcher {
    client: Client,
    config: PagerDutyConfig,
}

impl PagerDutyDispatcher {
    pub fn new(config: PagerDutyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Build the enqueue body for an event. Triggers carry the full payload
    /// for operator diagnosis; resolves carry the key and action only.
    fn request_for<'a>(&'a self, event: &'a AlertEvent) -> EnqueueRequest<'a> {
        let payload = match event.action {
            AlertAction::Trigger => Some(EventPayload {
                summary: format!(
                    "Kubernetes {} {} has 0 available replicas",
                    event.kind, event.resource_key
                ),
                severity: SEVERITY,
                source: SOURCE,
                component: &event.resource_key,
                group: GROUP,
                class: CLASS,
                custom_details: &event.metric,
            }),
            AlertAction::Resolve => None,
        };

        EnqueueRequest {
            routing_key: &self.config.routing_key,
            event_action: event.action,
            dedup_key: &event.dedup_key,
            payload,
        }
    }

    async fn send(&self, request: &EnqueueRequest<'_>) -> Result<()> {
        let response = self
            .client
            .post(self.config.events_url.clone())
            .json(request)
            .send()
            .await
            .context("Failed to send event")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Events API error ({}): {}", status, body);
        }

        Ok(())
    }
}

#[async_trait]
impl AlertDispatcher for PagerDutyDispatcher {
    async fn dispatch(&self, event: &AlertEvent) -> bool {
        if self.config.dry_run {
            info!(
                dedup_key = %event.dedup_key,
                action = %event.action,
                "Dry run, event not sent"
            );
            return true;
        }

        debug!(
            dedup_key = %event.dedup_key,
            action = %event.action,
            "Sending PagerDuty event"
        );

        match self.send(&self.request_for(event)).await {
            Ok(()) => {
                info!(
                    resource = %event.resource_key,
                    action = %event.action,
                    "Sent PagerDuty event"
                );
                true
            }
            Err(error) => {
                error!(
                    resource = %event.resource_key,
                    action = %event.action,
                    error = %error,
                    "Failed to send PagerDuty event"
                );
                false
            }
        }
    }
}
