//! Device control abstraction.
//!
//! The agent drives the device only through this trait, allowing the
//! ADB implementation to be swapped for a recording double in tests.

use crate::transport::ProtocolError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while controlling the device.
#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("transport error: {0}")]
    Transport(#[from] ProtocolError),
    #[error("unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },
}

/// The application currently in the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForegroundApp {
    /// Package name, e.g. `com.android.vending`.
    pub package: String,
    /// Fully qualified activity class name.
    pub activity: String,
}

impl ForegroundApp {
    /// Creates a foreground app record.
    pub fn new(package: impl Into<String>, activity: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            activity: activity.into(),
        }
    }
}

impl std::fmt::Display for ForegroundApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.package, self.activity)
    }
}

/// Synthetic input and app navigation on one device.
pub trait DeviceActuator: Send + Sync {
    /// Taps the screen at the given pixel.
    fn tap(&self, x: u32, y: u32) -> Result<(), ActuationError>;

    /// Swipes from one point to another over `duration`.
    fn swipe(
        &self,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        duration: Duration,
    ) -> Result<(), ActuationError>;

    /// Starts `activity` of `package`.
    fn app_start(&self, package: &str, activity: &str) -> Result<(), ActuationError>;

    /// Force-stops `package`.
    fn force_stop(&self, package: &str) -> Result<(), ActuationError>;

    /// Returns the application currently in the foreground.
    fn current_app(&self) -> Result<ForegroundApp, ActuationError>;

    /// Returns the display size as `(width, height)`.
    fn window_size(&self) -> Result<(u32, u32), ActuationError>;
}
