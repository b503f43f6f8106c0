//! Discrete phases of the countdown

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of the countdown state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Initial phase, nothing has been started yet
    #[default]
    Idle,
    /// Waiting out the pre-start delay
    Starting,
    /// Counting down
    Running,
    /// Cancelled by the user
    Stopped,
    /// Remaining time reached zero
    Finished,
}

impl TimerPhase {
    /// Whether a countdown sequence is in flight
    pub fn is_active(self) -> bool {
        matches!(self, TimerPhase::Starting | TimerPhase::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Starting => "starting",
            TimerPhase::Running => "running",
            TimerPhase::Stopped => "stopped",
            TimerPhase::Finished => "finished",
        }
    }
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_starting_and_running_are_active() {
        assert!(TimerPhase::Starting.is_active());
        assert!(TimerPhase::Running.is_active());
        assert!(!TimerPhase::Idle.is_active());
        assert!(!TimerPhase::Stopped.is_active());
        assert!(!TimerPhase::Finished.is_active());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&TimerPhase::Finished).unwrap();
        assert_eq!(json, "\"finished\"");
        assert_eq!(TimerPhase::default(), TimerPhase::Idle);
    }
}
