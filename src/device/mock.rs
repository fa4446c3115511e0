//! Recording actuator for tests and dry runs.

use super::actuator::{ActuationError, DeviceActuator, ForegroundApp};
use crate::transport::ProtocolError;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A device call observed by [`MockActuator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorCall {
    /// `tap(x, y)`.
    Tap(u32, u32),
    /// `swipe(..)` with its endpoints and duration.
    Swipe {
        from: (u32, u32),
        to: (u32, u32),
        duration: Duration,
    },
    /// `app_start(package, activity)`.
    AppStart {
        package: String,
        activity: String,
    },
    /// `force_stop(package)`.
    ForceStop(String),
}

#[derive(Debug)]
struct MockState {
    foreground: ForegroundApp,
    window_size: (u32, u32),
    fail_actions: bool,
    calls: Vec<ActuatorCall>,
}

/// Actuator that records calls instead of touching a device.
///
/// Starting an app makes it the foreground app, so multi-cycle scenarios
/// behave like a real device.
#[derive(Debug)]
pub struct MockActuator {
    state: Mutex<MockState>,
}

impl MockActuator {
    /// Creates a mock reporting `foreground` and a 1080x2340 display.
    pub fn new(foreground: ForegroundApp) -> Self {
        Self {
            state: Mutex::new(MockState {
                foreground,
                window_size: (1080, 2340),
                fail_actions: false,
                calls: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the reported display size.
    pub fn with_window_size(self, width: u32, height: u32) -> Self {
        self.lock().window_size = (width, height);
        self
    }

    /// Changes the foreground app.
    pub fn set_foreground(&self, app: ForegroundApp) {
        self.lock().foreground = app;
    }

    /// Makes every action fail as if the device disconnected.
    pub fn set_failing(&self, fail: bool) {
        self.lock().fail_actions = fail;
    }

    /// Returns and clears the recorded calls.
    pub fn take_calls(&self) -> Vec<ActuatorCall> {
        std::mem::take(&mut self.lock().calls)
    }

    fn record(&self, call: ActuatorCall) -> Result<(), ActuationError> {
        let mut state = self.lock();
        if state.fail_actions {
            return Err(ActuationError::Transport(ProtocolError::ConnectionClosed));
        }
        if let ActuatorCall::AppStart { package, activity } = &call {
            state.foreground = ForegroundApp::new(package.clone(), activity.clone());
        }
        state.calls.push(call);
        Ok(())
    }
}

impl DeviceActuator for MockActuator {
    fn tap(&self, x: u32, y: u32) -> Result<(), ActuationError> {
        self.record(ActuatorCall::Tap(x, y))
    }

    fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration: Duration,
    ) -> Result<(), ActuationError> {
        self.record(ActuatorCall::Swipe {
            from: (x1, y1),
            to: (x2, y2),
            duration,
        })
    }

    fn app_start(&self, package: &str, activity: &str) -> Result<(), ActuationError> {
        self.record(ActuatorCall::AppStart {
            package: package.to_string(),
            activity: activity.to_string(),
        })
    }

    fn force_stop(&self, package: &str) -> Result<(), ActuationError> {
        self.record(ActuatorCall::ForceStop(package.to_string()))
    }

    fn current_app(&self) -> Result<ForegroundApp, ActuationError> {
        Ok(self.lock().foreground.clone())
    }

    fn window_size(&self) -> Result<(u32, u32), ActuationError> {
        Ok(self.lock().window_size)
    }
}
