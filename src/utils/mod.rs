//! Utility functions module
//!
//! This module contains helpers used throughout the application.

pub mod observable;
pub mod signals;
pub mod time_format;

// Re-export main items
pub use observable::Observable;
pub use signals::shutdown_signal;
pub use time_format::TimeBreakdown;
