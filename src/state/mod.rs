//! State management module
//!
//! This module contains the timer's observable state types and the host
//! application state that owns the engine.

pub mod app_state;
pub mod timer_phase;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use timer_phase::TimerPhase;
pub use timer_state::{DurationFields, TimerSnapshot};
