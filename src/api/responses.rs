//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{DurationFields, TimerSnapshot};

/// Body of POST /timer/configure
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfigureRequest {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

/// Body of POST /timer/fields; absent fields keep their remembered value
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FieldsRequest {
    pub hours: Option<u32>,
    pub minutes: Option<u32>,
    pub seconds: Option<u32>,
}

/// Response for every timer command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
    /// Counter text, `HH:MM:SS.cc`
    pub display: String,
}

impl ApiResponse {
    pub fn new(status: &str, message: String, timer: TimerSnapshot) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            display: timer.display().to_string(),
            timer,
        }
    }

    /// The command took effect
    pub fn accepted(message: String, timer: TimerSnapshot) -> Self {
        Self::new("accepted", message, timer)
    }

    /// The command was dropped because its input was out of range
    pub fn ignored(message: String, timer: TimerSnapshot) -> Self {
        Self::new("ignored", message, timer)
    }
}

/// Status response with timer details and server metadata
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub fields: DurationFields,
    pub display: String,
    /// Fraction of the hourglass that has run through
    pub progress: f64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
