//! Millisecond decomposition for counter displays

use std::fmt;

use serde::{Deserialize, Serialize};

const MILLIS_PER_HOUR: u64 = 3_600_000;
const MILLIS_PER_MINUTE: u64 = 60_000;
const MILLIS_PER_SECOND: u64 = 1000;

/// A millisecond count split into display units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBreakdown {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub hundredths: u64,
}

impl TimeBreakdown {
    pub fn from_millis(millis: u64) -> Self {
        Self {
            hours: millis / MILLIS_PER_HOUR,
            minutes: (millis % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE,
            seconds: (millis % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND,
            hundredths: (millis % MILLIS_PER_SECOND) / 10,
        }
    }

    /// Compact human form, e.g. `1h 2m 3s`, omitting leading zero units
    pub fn humanize(&self) -> String {
        if self.hours > 0 {
            format!("{}h {}m {}s", self.hours, self.minutes, self.seconds)
        } else if self.minutes > 0 {
            format!("{}m {}s", self.minutes, self.seconds)
        } else {
            format!("{}s", self.seconds)
        }
    }
}

impl fmt::Display for TimeBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:02}",
            self.hours, self.minutes, self.seconds, self.hundredths
        )
    }
}
