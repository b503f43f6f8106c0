//! Timer engine module
//!
//! The countdown state machine and the events it publishes.

pub mod events;
pub mod timer_engine;

pub use events::TimerEvent;
pub use timer_engine::{TimerEngine, DEFAULT_DURATION, DEFAULT_DURATION_MS, START_DELAY, TICK_INTERVAL};
