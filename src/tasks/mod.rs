//! Background tasks module
//!
//! This module contains the scheduling primitive that drives the countdown.

pub mod tick_scheduler;

// Re-export main types
pub use tick_scheduler::{TaskHandle, TickScheduler};
