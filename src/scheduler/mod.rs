//! Fixed-period cycle scheduling.
//!
//! A timer fires every tick; a new cycle is submitted to the blocking
//! worker pool only when the previous one has finished, so at most one
//! cycle mutates the automation state at any time. Cycle failures and
//! panics are logged at the join boundary and never stop the loop.

use crate::agent::{CycleError, CycleReport, CycleTask};
use crate::metrics::MetricsRegistry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tick period in milliseconds.
    pub tick_ms: u64,
    /// Size of the worker pool running cycles.
    pub workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            workers: 3,
        }
    }
}

impl SchedulerConfig {
    /// Returns the tick period.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Builds the runtime: one thread for the timer, `workers` for cycles.
    pub fn build_runtime(&self) -> std::io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(self.workers.max(1))
            .thread_name("adimate-worker")
            .enable_all()
            .build()
    }
}

/// Counters describing a scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Ticks observed.
    pub ticks: u64,
    /// Cycles submitted to the pool.
    pub submitted: u64,
    /// Ticks skipped because a cycle was in flight.
    pub skipped: u64,
    /// Cycles that returned an error or panicked.
    pub failed: u64,
}

/// Submits at most one cycle at a time on a fixed tick.
pub struct CycleScheduler {
    tick: Duration,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl CycleScheduler {
    /// Creates a scheduler ticking at the configured period.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            tick: config.tick(),
            metrics: None,
        }
    }

    /// Attaches a metrics registry for skipped ticks and panics.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Runs cycles of `task` until `shutdown` is set.
    ///
    /// The in-flight cycle, if any, is awaited before returning.
    pub async fn run<T: CycleTask>(
        &self,
        task: Arc<T>,
        shutdown: Arc<AtomicBool>,
    ) -> SchedulerStats {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut stats = SchedulerStats::default();
        let mut in_flight: Option<JoinHandle<Result<CycleReport, CycleError>>> = None;

        tracing::info!(tick_ms = self.tick.as_millis() as u64, "Scheduler started");

        while !shutdown.load(Ordering::Relaxed) {
            interval.tick().await;
            stats.ticks += 1;

            if let Some(handle) = in_flight.take() {
                if !handle.is_finished() {
                    in_flight = Some(handle);
                    stats.skipped += 1;
                    if let Some(metrics) = &self.metrics {
                        metrics.record_skipped_tick();
                    }
                    continue;
                }
                self.settle(handle.await, &mut stats);
            }

            let task = Arc::clone(&task);
            in_flight = Some(tokio::task::spawn_blocking(move || task.run_cycle()));
            stats.submitted += 1;
        }

        if let Some(handle) = in_flight {
            self.settle(handle.await, &mut stats);
        }

        tracing::info!(
            ticks = stats.ticks,
            submitted = stats.submitted,
            skipped = stats.skipped,
            failed = stats.failed,
            "Scheduler stopped"
        );
        stats
    }

    fn settle(
        &self,
        outcome: Result<Result<CycleReport, CycleError>, JoinError>,
        stats: &mut SchedulerStats,
    ) {
        match outcome {
            Ok(Ok(report)) => {
                tracing::debug!(
                    sequence = report.sequence,
                    detected = report.detected,
                    action = report.action.name(),
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Cycle completed"
                );
            }
            Ok(Err(e)) => {
                stats.failed += 1;
                tracing::warn!(error = %e, "Cycle failed");
            }
            Err(e) => {
                stats.failed += 1;
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure();
                }
                tracing::error!(error = %e, "Cycle panicked");
            }
        }
    }
}
