//! Metrics collection and registry.

use crate::agent::{Action, AutomationState, CycleReport};
use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for the automation agent.
pub struct MetricsRegistry {
    registry: Registry,

    // Scheduler metrics
    cycles_total: IntCounter,
    cycle_failures_total: IntCounter,
    ticks_skipped_total: IntCounter,
    cycle_duration_seconds: Gauge,

    // Decision metrics
    detections_total: IntCounter,
    actions_total: IntCounterVec,

    // State metrics
    consecutive_no_ad_cycles: IntGauge,
    overlay_open: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all agent metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let cycles_total = IntCounter::new("adimate_cycles_total", "Completed automation cycles")?;
        let cycle_failures_total = IntCounter::new(
            "adimate_cycle_failures_total",
            "Cycles that ended early with an error",
        )?;
        let ticks_skipped_total = IntCounter::new(
            "adimate_ticks_skipped_total",
            "Scheduler ticks skipped because a cycle was still running",
        )?;
        let cycle_duration_seconds = Gauge::new(
            "adimate_cycle_duration_seconds",
            "Wall time of the most recent completed cycle",
        )?;

        let detections_total = IntCounter::new(
            "adimate_detections_total",
            "Frames in which the ad template was found",
        )?;
        let actions_total = IntCounterVec::new(
            Opts::new("adimate_actions_total", "Device actions performed by kind"),
            &["action"],
        )?;

        let consecutive_no_ad_cycles = IntGauge::new(
            "adimate_consecutive_no_ad_cycles",
            "Main-view cycles since the template was last seen",
        )?;
        let overlay_open = IntGauge::new(
            "adimate_overlay_open",
            "Whether an ad surface is currently being timed (1=open, 0=closed)",
        )?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycle_failures_total.clone()))?;
        registry.register(Box::new(ticks_skipped_total.clone()))?;
        registry.register(Box::new(cycle_duration_seconds.clone()))?;
        registry.register(Box::new(detections_total.clone()))?;
        registry.register(Box::new(actions_total.clone()))?;
        registry.register(Box::new(consecutive_no_ad_cycles.clone()))?;
        registry.register(Box::new(overlay_open.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            cycle_failures_total,
            ticks_skipped_total,
            cycle_duration_seconds,
            detections_total,
            actions_total,
            consecutive_no_ad_cycles,
            overlay_open,
        })
    }

    /// Records a completed cycle.
    pub fn record_cycle(&self, report: &CycleReport) {
        self.cycles_total.inc();
        self.cycle_duration_seconds.set(report.elapsed.as_secs_f64());
        if report.detected {
            self.detections_total.inc();
        }
        if report.action != Action::None {
            self.actions_total
                .with_label_values(&[report.action.name()])
                .inc();
        }
    }

    /// Records a cycle that ended with an error.
    pub fn record_failure(&self) {
        self.cycle_failures_total.inc();
    }

    /// Records a tick skipped because a cycle was in flight.
    pub fn record_skipped_tick(&self) {
        self.ticks_skipped_total.inc();
    }

    /// Mirrors the automation state into gauges.
    pub fn observe_state(&self, state: &AutomationState) {
        self.consecutive_no_ad_cycles
            .set(state.consecutive_no_ad_cycles() as i64);
        self.overlay_open
            .set(if state.overlay_closed() { 0 } else { 1 });
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_record_cycle() {
        let registry = MetricsRegistry::new().unwrap();

        registry.record_cycle(&CycleReport {
            sequence: 1,
            detected: true,
            action: Action::Tap { x: 1, y: 2 },
            elapsed: Duration::from_millis(250),
        });
        registry.record_cycle(&CycleReport {
            sequence: 2,
            detected: false,
            action: Action::None,
            elapsed: Duration::from_millis(50),
        });
        registry.record_failure();
        registry.record_skipped_tick();

        let output = registry.encode().unwrap();
        assert!(output.contains("adimate_cycles_total 2"));
        assert!(output.contains("adimate_detections_total 1"));
        assert!(output.contains("adimate_actions_total{action=\"tap\"} 1"));
        assert!(output.contains("adimate_cycle_failures_total 1"));
        assert!(output.contains("adimate_ticks_skipped_total 1"));
    }

    #[test]
    fn test_observe_state() {
        let registry = MetricsRegistry::new().unwrap();
        registry.observe_state(&AutomationState::new());

        let output = registry.encode().unwrap();
        assert!(output.contains("adimate_overlay_open 0"));
        assert!(output.contains("adimate_consecutive_no_ad_cycles 0"));
    }
}
