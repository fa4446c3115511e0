//! Decision state machine.
//!
//! Turns a detection result and the current foreground app into a single
//! [`Action`], updating [`AutomationState`] along the way. Rules are
//! evaluated in priority order:
//!
//! 1. stuck screen (duplicate frame or too many idle cycles): restart
//! 2. target main view: tap a detected ad, otherwise scroll
//! 3. target ad surface: start the ad timer, leave once it expires
//! 4. other target views: wait
//! 5. app store or any other app: return to the target

use super::{AgentConfig, AutomationState};
use crate::detection::Detection;
use crate::device::{ActuationError, DeviceActuator, ForegroundApp};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::info;

/// The device action chosen for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do this cycle.
    None,
    /// Tap the detected ad.
    Tap { x: u32, y: u32 },
    /// Swipe up to advance the content feed.
    Scroll,
    /// Force-stop and relaunch the target app.
    Restart,
    /// Bring the target app's main view to the front.
    ReturnToTarget,
}

impl Action {
    /// Short name used for logging and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Action::None => "none",
            Action::Tap { .. } => "tap",
            Action::Scroll => "scroll",
            Action::Restart => "restart",
            Action::ReturnToTarget => "return",
        }
    }
}

/// Decides and performs the per-cycle device action.
pub struct AgentStateMachine {
    target_package: String,
    main_activity: String,
    store_package: String,
    ad_activities: HashSet<String>,
    ad_timeout: Duration,
    max_idle_cycles: u32,
    swipe_duration: Duration,
}

impl AgentStateMachine {
    /// Creates a state machine from the agent configuration.
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            target_package: config.target_package.clone(),
            main_activity: config.main_activity.clone(),
            store_package: config.store_package.clone(),
            ad_activities: config.ad_activities.iter().cloned().collect(),
            ad_timeout: config.ad_timeout(),
            max_idle_cycles: config.max_idle_cycles,
            swipe_duration: config.swipe_duration(),
        }
    }

    /// Chooses the action for this cycle and updates `state`.
    ///
    /// The searched frame always becomes `state.last_frame`.
    pub fn decide(
        &self,
        detection: Detection,
        foreground: &ForegroundApp,
        state: &mut AutomationState,
        now: Instant,
    ) -> Action {
        let Detection { point, frame, .. } = detection;

        let duplicate = state
            .last_frame
            .as_ref()
            .is_some_and(|last| last.same_pixels(&frame));

        let action = if duplicate || state.consecutive_no_ad_cycles > self.max_idle_cycles {
            info!(
                duplicate,
                idle_cycles = state.consecutive_no_ad_cycles,
                "Screen looks stuck, restarting target app"
            );
            state.consecutive_no_ad_cycles = 0;
            state.overlay_closed = true;
            Action::Restart
        } else if foreground.package == self.target_package {
            if foreground.activity == self.main_activity {
                self.decide_main_view(point, state)
            } else if self.ad_activities.contains(&foreground.activity) {
                self.decide_ad_surface(state, now)
            } else {
                tracing::debug!(activity = %foreground.activity, "Target app in secondary view");
                Action::None
            }
        } else if foreground.package == self.store_package {
            info!("Leaving app store");
            Action::ReturnToTarget
        } else {
            info!(foreground = %foreground, "Foreign app in front, returning to target");
            Action::ReturnToTarget
        };

        state.last_frame = Some(frame);
        action
    }

    fn decide_main_view(&self, point: Option<(u32, u32)>, state: &mut AutomationState) -> Action {
        match point {
            Some((x, y)) => {
                state.consecutive_no_ad_cycles = 0;
                state.overlay_closed = true;
                info!(x, y, "Ad found, tapping");
                Action::Tap { x, y }
            }
            None => {
                state.consecutive_no_ad_cycles += 1;
                Action::Scroll
            }
        }
    }

    fn decide_ad_surface(&self, state: &mut AutomationState, now: Instant) -> Action {
        if state.overlay_closed {
            state.overlay_close_deadline = Some(now + self.ad_timeout);
            state.overlay_closed = false;

            let timeout = chrono::Duration::from_std(self.ad_timeout)
                .unwrap_or_else(|_| chrono::Duration::zero());
            let close_at = chrono::Local::now() + timeout;
            info!(close_at = %close_at.format("%H:%M:%S"), "Ad opened");
            Action::None
        } else if state.deadline_elapsed(now) {
            state.overlay_closed = true;
            info!("Ad timed out, closing");
            Action::ReturnToTarget
        } else {
            Action::None
        }
    }

    /// Performs `action` on the device.
    ///
    /// State has already been updated by [`decide`](Self::decide) and is
    /// not rolled back on failure.
    pub fn execute(
        &self,
        action: Action,
        actuator: &dyn DeviceActuator,
    ) -> Result<(), ActuationError> {
        match action {
            Action::None => Ok(()),
            Action::Tap { x, y } => actuator.tap(x, y),
            Action::Scroll => {
                let (width, height) = actuator.window_size()?;
                let x = width / 2;
                actuator.swipe(x, height / 4 * 3, x, height / 4, self.swipe_duration)
            }
            Action::Restart => {
                actuator.force_stop(&self.target_package)?;
                actuator.app_start(&self.target_package, &self.main_activity)
            }
            Action::ReturnToTarget => {
                actuator.app_start(&self.target_package, &self.main_activity)
            }
        }
    }
}
