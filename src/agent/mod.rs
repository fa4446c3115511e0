//! The automation agent.
//!
//! Holds the mutable [`AutomationState`], the [`AgentStateMachine`] that
//! turns detections into device actions, and the [`Agent`] that runs one
//! capture → detect → decide → act cycle at a time.

mod config;
mod cycle;
mod machine;
mod state;

pub use config::AgentConfig;
pub use cycle::{Agent, CycleError, CycleReport, CycleTask};
pub use machine::{Action, AgentStateMachine};
pub use state::AutomationState;
