//! Transport connection settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum response budget; a full-HD frame buffer is close to 10 MB.
pub const MIN_RESPONSE_BYTES: usize = 20 * 1024 * 1024;

/// Connection settings for the ADB server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Address of the ADB server (`host:port`).
    pub server_addr: String,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Read/write timeout in milliseconds.
    pub io_timeout_ms: u64,
    /// Upper bound on a single response payload.
    pub max_response_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            server_addr: String::from("127.0.0.1:5037"),
            connect_timeout_ms: 2_000,
            io_timeout_ms: 10_000,
            max_response_bytes: 64 * 1024 * 1024,
        }
    }
}

impl TransportConfig {
    /// Returns the connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the read/write timeout.
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}
