//! Point-in-time view of the countdown

use serde::{Deserialize, Serialize};

use super::TimerPhase;
use crate::utils::TimeBreakdown;

/// Hours, minutes and seconds as last accepted by the engine.
///
/// Only constructible through [`DurationFields::new`], so every value is
/// within the same ranges `configure` enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationFields {
    hours: u32,
    minutes: u32,
    seconds: u32,
}

impl DurationFields {
    pub const MAX_HOURS: u32 = 99;
    pub const MAX_MINUTES: u32 = 60;
    pub const MAX_SECONDS: u32 = 60;

    /// Build fields if every component is within range
    pub const fn new(hours: u32, minutes: u32, seconds: u32) -> Option<Self> {
        if hours <= Self::MAX_HOURS && minutes <= Self::MAX_MINUTES && seconds <= Self::MAX_SECONDS {
            Some(Self { hours, minutes, seconds })
        } else {
            None
        }
    }

    pub const fn hours(&self) -> u32 {
        self.hours
    }

    pub const fn minutes(&self) -> u32 {
        self.minutes
    }

    pub const fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Total length in milliseconds
    pub const fn total_millis(&self) -> u64 {
        (self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64) * 1000
    }
}

/// Timer state snapshot handed to newly attached observers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    /// Configured duration, picked up by the next start
    pub duration_ms: u64,
    pub remaining_ms: u64,
    /// Target of the countdown in flight, if any has been started
    pub target_ms: u64,
}

impl TimerSnapshot {
    /// Check if a countdown sequence is in flight
    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Fraction of sand that has passed, in `[0.0, 1.0]`
    pub fn progress(&self) -> f64 {
        if self.phase != TimerPhase::Running || self.target_ms == 0 {
            return 0.0;
        }
        let passed = self.target_ms.saturating_sub(self.remaining_ms);
        passed as f64 / self.target_ms as f64
    }

    /// Time a counter display should show for this snapshot
    pub fn display_ms(&self) -> u64 {
        if self.is_active() {
            self.remaining_ms
        } else {
            self.duration_ms
        }
    }

    pub fn display(&self) -> TimeBreakdown {
        TimeBreakdown::from_millis(self.display_ms())
    }
}
