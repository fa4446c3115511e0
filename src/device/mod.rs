//! Device control.
//!
//! The [`DeviceActuator`] trait is the only way the agent touches the
//! device. [`AdbDevice`] drives a real device through `shell:` requests;
//! [`MockActuator`] records calls for tests.

mod actuator;
mod adb;
mod mock;

pub use actuator::{ActuationError, DeviceActuator, ForegroundApp};
pub use adb::{parse_focused_app, parse_window_size, AdbDevice};
pub use mock::{ActuatorCall, MockActuator};
