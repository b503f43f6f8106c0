//! Hourglass Timer - A countdown timer engine with an HTTP control surface
//!
//! The core is [`TimerEngine`], a countdown state machine driven by a
//! cancellable [`TickScheduler`]. The HTTP layer hosts a single engine so a
//! separate presentation layer can configure, start, stop and observe it.

pub mod config;
pub mod engine;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use engine::{TimerEngine, TimerEvent};
pub use state::{AppState, DurationFields, TimerPhase, TimerSnapshot};
pub use tasks::{TaskHandle, TickScheduler};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
