//! Signal handling for graceful shutdown

use futures::stream::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use tracing::info;

/// Wait for the first SIGTERM or SIGINT and return its number
pub async fn shutdown_signal() -> std::io::Result<i32> {
    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    let handle = signals.handle();

    let received = signals.next().await.unwrap_or(SIGTERM);
    info!("Received signal: {}", received);

    handle.close();
    Ok(received)
}
