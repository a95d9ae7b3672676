//! Signal handling for graceful shutdown

use tracing::info;

/// Wait for a shutdown signal (SIGTERM, SIGINT) and return its number
#[cfg(unix)]
pub async fn shutdown_signal() -> std::io::Result<i32> {
    use futures::stream::StreamExt;
    use signal_hook_tokio::Signals;

    let mut signals = Signals::new([
        signal_hook::consts::SIGTERM,
        signal_hook::consts::SIGINT,
    ])?;
    let handle = signals.handle();

    let signal = signals.next().await.unwrap_or(signal_hook::consts::SIGTERM);
    info!("Received signal: {}", signal);
    handle.close();
    Ok(signal)
}

/// Wait for Ctrl-C
#[cfg(not(unix))]
pub async fn shutdown_signal() -> std::io::Result<i32> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C");
    Ok(2)
}
