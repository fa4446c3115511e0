//! One capture → detect → decide → act iteration.

use super::{Action, AgentStateMachine, AutomationState};
use crate::capture::{CaptureError, FrameSource};
use crate::detection::AdDetector;
use crate::device::{ActuationError, DeviceActuator};
use crate::metrics::MetricsRegistry;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors that end a cycle early.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("could not determine foreground app: {0}")]
    Foreground(#[source] ActuationError),
    #[error("action {action} failed: {source}")]
    Actuation {
        action: &'static str,
        #[source]
        source: ActuationError,
    },
}

/// Summary of a completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Sequence number of the captured frame.
    pub sequence: u64,
    /// Whether the template was found.
    pub detected: bool,
    /// The action performed.
    pub action: Action,
    /// Wall time spent in the cycle.
    pub elapsed: Duration,
}

/// A unit of work submitted by the scheduler.
pub trait CycleTask: Send + Sync + 'static {
    /// Runs one full cycle.
    fn run_cycle(&self) -> Result<CycleReport, CycleError>;
}

/// The automation agent: all components needed to run a cycle.
pub struct Agent {
    source: Box<dyn FrameSource>,
    detector: AdDetector,
    machine: AgentStateMachine,
    actuator: Arc<dyn DeviceActuator>,
    state: Mutex<AutomationState>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Agent {
    /// Creates an agent with a fresh automation state.
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: AdDetector,
        machine: AgentStateMachine,
        actuator: Arc<dyn DeviceActuator>,
    ) -> Self {
        Self {
            source,
            detector,
            machine,
            actuator,
            state: Mutex::new(AutomationState::new()),
            metrics: None,
        }
    }

    /// Attaches a metrics registry updated after every cycle.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns a copy of the current automation state.
    pub fn state(&self) -> AutomationState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, AutomationState> {
        // A panicking cycle leaves the state consistent enough to continue.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cycle(&self) -> Result<CycleReport, CycleError> {
        let start = Instant::now();

        let frame = self.source.capture()?;
        let sequence = frame.sequence();

        let detection = self.detector.detect(frame);
        let detected = detection.is_found();

        let foreground = self
            .actuator
            .current_app()
            .map_err(CycleError::Foreground)?;

        let action = {
            let mut state = self.lock_state();
            tracing::debug!(
                foreground = %foreground,
                overlay_open = !state.overlay_closed(),
                "Deciding"
            );
            let action = self
                .machine
                .decide(detection, &foreground, &mut state, Instant::now());
            if let Some(metrics) = &self.metrics {
                metrics.observe_state(&state);
            }
            action
        };

        self.machine
            .execute(action, self.actuator.as_ref())
            .map_err(|source| CycleError::Actuation {
                action: action.name(),
                source,
            })?;

        Ok(CycleReport {
            sequence,
            detected,
            action,
            elapsed: start.elapsed(),
        })
    }
}

impl CycleTask for Agent {
    fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let result = self.cycle();
        if let Some(metrics) = &self.metrics {
            match &result {
                Ok(report) => metrics.record_cycle(report),
                Err(_) => metrics.record_failure(),
            }
        }
        result
    }
}
