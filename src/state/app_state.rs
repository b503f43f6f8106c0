//! Main application state management

use std::{
    sync::{Mutex, PoisonError},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::{engine::TimerEngine, utils::TimeBreakdown};

/// Host state shared by every HTTP handler: the engine plus server metadata
#[derive(Debug)]
pub struct AppState {
    /// The single countdown engine this server drives
    pub engine: TimerEngine,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last command tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(engine: TimerEngine, port: u16, host: String) -> Self {
        Self {
            engine,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Run a command against the engine and record it as the last action
    pub fn command<F, R>(&self, action: &str, command: F) -> R
    where
        F: FnOnce(&TimerEngine) -> R,
    {
        info!("Command received: {}", action);
        let result = command(&self.engine);

        *self.last_action.lock().unwrap_or_else(PoisonError::into_inner) = Some(action.to_string());
        *self.last_action_time.lock().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());

        result
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let millis = u64::try_from(self.start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
        TimeBreakdown::from_millis(millis).humanize()
    }
}
