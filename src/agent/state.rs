//! Mutable automation state.

use crate::capture::Frame;
use std::time::Instant;

/// The single mutable record carried between cycles.
///
/// Only [`AgentStateMachine::decide`](super::AgentStateMachine::decide)
/// mutates it; everything else reads it through accessors.
#[derive(Debug, Clone)]
pub struct AutomationState {
    /// Frame seen by the previous cycle, for duplicate detection.
    pub(super) last_frame: Option<Frame>,
    /// Main-view cycles since the template was last seen.
    pub(super) consecutive_no_ad_cycles: u32,
    /// False while an ad surface is being given time to finish.
    pub(super) overlay_closed: bool,
    /// When a running ad surface will be forcibly left.
    pub(super) overlay_close_deadline: Option<Instant>,
}

impl Default for AutomationState {
    fn default() -> Self {
        Self {
            last_frame: None,
            consecutive_no_ad_cycles: 0,
            overlay_closed: true, // Assume a clean start: no ad on screen
            overlay_close_deadline: None,
        }
    }
}

impl AutomationState {
    /// Creates the clean start state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the frame retained from the previous cycle.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Returns the number of main-view cycles without a detection.
    pub fn consecutive_no_ad_cycles(&self) -> u32 {
        self.consecutive_no_ad_cycles
    }

    /// Returns true unless an ad surface is currently being timed.
    pub fn overlay_closed(&self) -> bool {
        self.overlay_closed
    }

    /// Returns the deadline of the ad surface being timed, if any.
    pub fn overlay_close_deadline(&self) -> Option<Instant> {
        self.overlay_close_deadline
    }

    /// Returns true if no deadline is pending or it has passed.
    pub fn deadline_elapsed(&self, now: Instant) -> bool {
        self.overlay_close_deadline
            .map_or(true, |deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_starts_clean() {
        let state = AutomationState::new();
        assert!(state.overlay_closed());
        assert_eq!(state.consecutive_no_ad_cycles(), 0);
        assert!(state.last_frame().is_none());
        assert!(state.deadline_elapsed(Instant::now()));
    }

    #[test]
    fn test_deadline_elapsed() {
        let now = Instant::now();
        let state = AutomationState {
            overlay_close_deadline: Some(now + Duration::from_secs(35)),
            ..AutomationState::default()
        };

        assert!(!state.deadline_elapsed(now));
        assert!(!state.deadline_elapsed(now + Duration::from_secs(34)));
        assert!(state.deadline_elapsed(now + Duration::from_secs(35)));
    }
}
