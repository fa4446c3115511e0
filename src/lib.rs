//! Adimate: ad-dismissing automation agent for one Android device.
//!
//! Watches the screen of a device reachable through the ADB server,
//! recognizes an in-app ad by template matching and drives the device
//! back to the target app.
//!
//! # Architecture
//!
//! The system follows an explicit data flow, one cycle at a time:
//!
//! ```text
//! transport → capture → detection → agent (decide) → device (act)
//!                                      ↑
//!                        scheduler (fixed tick, ≤ 1 in flight)
//! ```
//!
//! # Design Principles
//!
//! - **Best effort**: missed detections are corrected by timers and restarts
//! - **Failure firewall**: a failed cycle is logged and retried next tick
//! - **Single writer**: only the running cycle mutates [`AutomationState`]
//! - **No connection reuse**: every transport request uses its own socket
//!
//! # Example
//!
//! ```no_run
//! use adimate::{
//!     agent::{Agent, AgentConfig, AgentStateMachine, CycleTask},
//!     capture::{CaptureConfig, FrameCapture},
//!     detection::{load_template, AdDetector, DetectionConfig},
//!     device::AdbDevice,
//!     transport::{TransportChannel, TransportConfig},
//! };
//! use std::sync::Arc;
//!
//! let channel = TransportChannel::new(TransportConfig::default(), "192.168.1.20:5555");
//! let detection = DetectionConfig::default();
//! let template = load_template(&detection.template_path).unwrap();
//!
//! let agent = Agent::new(
//!     Box::new(FrameCapture::new(channel.clone(), &CaptureConfig::default())),
//!     AdDetector::new(template, &detection),
//!     AgentStateMachine::new(&AgentConfig::default()),
//!     Arc::new(AdbDevice::new(channel)),
//! );
//!
//! match agent.run_cycle() {
//!     Ok(report) => println!("performed {:?}", report.action),
//!     Err(e) => eprintln!("cycle failed: {e}"),
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod agent;
pub mod capture;
pub mod config;
pub mod detection;
pub mod device;
pub mod metrics;
pub mod scheduler;
pub mod transport;

// Re-export commonly used types at crate root
pub use agent::{Action, Agent, AgentConfig, AgentStateMachine, AutomationState, CycleError};
pub use capture::{Frame, FrameBufferHeader, FrameCapture, FrameSource};
pub use config::{ConfigError, FileConfig};
pub use detection::{AdDetector, Detection};
pub use device::{AdbDevice, DeviceActuator, ForegroundApp};
pub use scheduler::CycleScheduler;
pub use transport::{ProtocolError, TransportChannel};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
