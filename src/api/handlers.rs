//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::state::AppState;
use super::responses::{
    ApiResponse, ConfigureRequest, FieldsRequest, HealthResponse, StatusResponse,
};

/// Handle POST /timer/configure - Set hours, minutes and seconds together
pub async fn configure_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfigureRequest>,
) -> Json<ApiResponse> {
    let accepted = state.command("configure", |engine| {
        engine.configure(request.hours, request.minutes, request.seconds)
    });
    let snapshot = state.engine.snapshot();

    if accepted {
        Json(ApiResponse::accepted(
            format!("Duration set to {} ms", snapshot.duration_ms),
            snapshot,
        ))
    } else {
        info!("Configure input out of range: {:?}", request);
        Json(ApiResponse::ignored(
            "Duration out of range, ignored".to_string(),
            snapshot,
        ))
    }
}

/// Handle POST /timer/fields - Update individual duration fields
pub async fn fields_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FieldsRequest>,
) -> Json<ApiResponse> {
    let accepted = state.command("fields", |engine| {
        engine.set_fields(request.hours, request.minutes, request.seconds)
    });
    let snapshot = state.engine.snapshot();

    if accepted {
        Json(ApiResponse::accepted(
            format!("Duration set to {} ms", snapshot.duration_ms),
            snapshot,
        ))
    } else {
        info!("Field input out of range: {:?}", request);
        Json(ApiResponse::ignored(
            "Field out of range, ignored".to_string(),
            snapshot,
        ))
    }
}

/// Handle POST /timer/start - Begin a new countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.command("start", |engine| engine.start());
    Json(ApiResponse::accepted(
        "Countdown starting".to_string(),
        state.engine.snapshot(),
    ))
}

/// Handle POST /timer/stop - Cancel the countdown in flight
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.command("stop", |engine| engine.stop());
    Json(ApiResponse::accepted(
        "Countdown stopped".to_string(),
        state.engine.snapshot(),
    ))
}

/// Handle GET /timer/status - Return the current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timer = state.engine.snapshot();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        display: timer.display().to_string(),
        progress: timer.progress(),
        fields: state.engine.fields(),
        timer,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /timer/events - Stream a snapshot, then every engine event in order
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (snapshot, rx) = state.engine.subscribe();
    info!("Event subscriber attached");

    let initial = stream::once(async move { sse_event("snapshot", &snapshot) });
    let updates = stream::unfold((state, rx), |(state, mut rx)| async move {
        match rx.recv().await {
            Ok(event) => {
                let sse = sse_event(event.name(), &event);
                Some((sse, (state, rx)))
            }
            Err(RecvError::Lagged(skipped)) => {
                // Resynchronise the subscriber instead of replaying a gap
                warn!("Event subscriber lagged by {} events", skipped);
                let sse = sse_event("snapshot", &state.engine.snapshot());
                Some((sse, (state, rx)))
            }
            Err(RecvError::Closed) => None,
        }
    });

    Sse::new(initial.chain(updates).map(Ok)).keep_alive(KeepAlive::default())
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

fn sse_event<T: Serialize>(name: &str, payload: &T) -> Event {
    match serde_json::to_string(payload) {
        Ok(json) => Event::default().event(name).data(json),
        Err(e) => {
            error!("Failed to encode {} event: {}", name, e);
            Event::default().event("error").data(e.to_string())
        }
    }
}
