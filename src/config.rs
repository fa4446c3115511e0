//! Configuration file format and validation.
//!
//! Every section is optional; missing sections and fields fall back to
//! defaults so the agent runs without a configuration file.

use crate::agent::AgentConfig;
use crate::capture::CaptureConfig;
use crate::detection::DetectionConfig;
use crate::metrics::MetricsConfig;
use crate::scheduler::SchedulerConfig;
use crate::transport::{TransportConfig, MIN_RESPONSE_BYTES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Device selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial of the device as known to the ADB server (e.g. `192.168.1.20:5555`).
    pub serial: Option<String>,
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("no device serial configured")]
    MissingSerial,
    #[error("response budget of {0} bytes is too small for a frame buffer")]
    ResponseBudgetTooSmall(usize),
    #[error("detection threshold must be within (0, 1], got {0}")]
    InvalidThreshold(f32),
    #[error("search scale must be at least 1")]
    InvalidSearchScale,
    #[error("scheduler tick must be non-zero")]
    InvalidTick,
    #[error("worker pool must have at least one worker")]
    InvalidWorkers,
    #[error("target package and main activity are required")]
    MissingTarget,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub device: DeviceConfig,
    pub transport: TransportConfig,
    pub capture: CaptureConfig,
    pub detection: DetectionConfig,
    pub agent: AgentConfig,
    pub scheduler: SchedulerConfig,
    pub metrics: MetricsConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Validation is left to the caller so that command-line overrides
    /// can be applied first.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.serial.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::MissingSerial);
        }
        if self.transport.max_response_bytes < MIN_RESPONSE_BYTES {
            return Err(ConfigError::ResponseBudgetTooSmall(
                self.transport.max_response_bytes,
            ));
        }
        let threshold = self.detection.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if self.detection.search_scale == 0 {
            return Err(ConfigError::InvalidSearchScale);
        }
        if self.scheduler.tick_ms == 0 {
            return Err(ConfigError::InvalidTick);
        }
        if self.scheduler.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.agent.target_package.is_empty() || self.agent.main_activity.is_empty() {
            return Err(ConfigError::MissingTarget);
        }
        Ok(())
    }
}
