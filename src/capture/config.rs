//! Screen capture configuration.

use serde::{Deserialize, Serialize};

/// Strategy used to obtain a frame from the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMethod {
    /// Raw `framebuffer:` service; no encoding on the device.
    #[default]
    Framebuffer,
    /// `exec:screencap -p`; PNG encoded, slower but widely supported.
    Png,
}

/// Configuration for screen capture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture strategy.
    pub method: CaptureMethod,
}
