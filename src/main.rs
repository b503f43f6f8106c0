//! Hourglass Timer - A countdown timer engine with an HTTP control surface
//!
//! This is the main entry point for the hourglass-timer server.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use hourglass_timer::{
    config::Config,
    state::AppState,
    api::create_router,
    engine::TimerEngine,
    tasks::TickScheduler,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("hourglass_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting hourglass-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, duration={}h {}m {}s",
          config.host, config.port, config.hours, config.minutes, config.seconds);

    // Create the engine and the application state around it
    let duration = config
        .initial_duration()
        .context("initial duration out of range")?;
    let engine = TimerEngine::with_duration(TickScheduler::current(), duration);
    let state = Arc::new(AppState::new(engine, config.port, config.host.clone()));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/configure - Set hours, minutes and seconds");
    info!("  POST /timer/fields    - Set individual duration fields");
    info!("  POST /timer/start     - Start the countdown");
    info!("  POST /timer/stop      - Stop the countdown");
    info!("  GET  /timer/status    - Current timer status");
    info!("  GET  /timer/events    - Server-sent timer events");
    info!("  GET  /health          - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        signal = shutdown_signal() => {
            match signal {
                Ok(signal) => info!("Shutdown signal {} received", signal),
                Err(e) => tracing::error!("Failed to listen for shutdown signals: {}", e),
            }
        }
    }

    state.engine.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
