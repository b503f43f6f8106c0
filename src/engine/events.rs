//! Events published by the timer engine

use serde::{Deserialize, Serialize};

use crate::state::TimerPhase;

/// A single observable change, in the order the engine produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TimerEvent {
    PhaseChanged(TimerPhase),
    /// Remaining time in milliseconds
    RemainingTimeChanged(u64),
    /// Configured duration in milliseconds
    DurationChanged(u64),
}

impl TimerEvent {
    /// Event name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            TimerEvent::PhaseChanged(_) => "phase_changed",
            TimerEvent::RemainingTimeChanged(_) => "remaining_time_changed",
            TimerEvent::DurationChanged(_) => "duration_changed",
        }
    }
}
