//! Alert dispatch
//!
//! Turns classified events into outbound calls against the alerting
//! endpoint. A failed send is logged and reported as `false`; it never
//! crosses the run boundary as an error.

mod pagerduty;

pub use pagerduty::{PagerDutyConfig, PagerDutyDispatcher, DEFAULT_EVENTS_URL};

use crate::models::AlertEvent;

pub use async_trait::async_trait;

/// Trait for alert delivery implementations
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// Send one trigger or resolve event; returns true on success
    async fn dispatch(&self, event: &AlertEvent) -> bool;
}
