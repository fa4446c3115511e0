//! Prometheus metrics for the automation agent.
//!
//! # Metrics Exposed
//!
//! - `adimate_cycles_total` - Completed cycles
//! - `adimate_cycle_failures_total` - Cycles that ended with an error
//! - `adimate_ticks_skipped_total` - Ticks skipped while a cycle was in flight
//! - `adimate_cycle_duration_seconds` - Duration of the last completed cycle
//! - `adimate_detections_total` - Frames in which the template was found
//! - `adimate_actions_total{action}` - Device actions by kind
//! - `adimate_consecutive_no_ad_cycles` - Current idle counter
//! - `adimate_overlay_open` - Whether an ad surface is being timed
//!
//! The HTTP exporter is only built with the `metrics` feature.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, ServerError};

use serde::{Deserialize, Serialize};

/// Metrics exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Serve `/metrics` over HTTP (requires the `metrics` feature).
    pub enabled: bool,
    /// IP address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_addr: String::from("127.0.0.1"),
            port: 9090,
        }
    }
}
