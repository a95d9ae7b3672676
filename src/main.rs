//! Nuisance - A focus session timer that blocks distracting sites while you work
//!
//! This is the main entry point for the nuisance application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use nuisance::{
    api::create_router,
    config::Config,
    state::AppState,
    tasks::{countdown_display_task, window_pin_task, SessionController},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("nuisance={},tower_http=info", config.log_level()))
        .init();

    info!("Starting nuisance v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, work={}min, break={}min, hosts={}",
        config.host,
        config.port,
        config.work_minutes,
        config.break_minutes,
        config.hosts_file.display()
    );

    // Create application state
    let (state, streams) = AppState::from_config(&config);
    let state = Arc::new(state);

    // Entries left by a killed run must not outlive it
    state.startup_cleanup().await;

    let controller = SessionController::new(Arc::clone(&state));
    let controller_task = tokio::spawn(controller.run(streams.mode_changes));
    tokio::spawn(countdown_display_task(Arc::clone(&state), streams.updates));
    tokio::spawn(window_pin_task(Arc::clone(&state), config.window_title.clone()));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start                      - Start, resume or acknowledge");
    info!("  POST /pause | /resume | /reset   - Timer controls");
    info!("  POST /acknowledge                - Silence the alarm and move on");
    info!("  PUT  /durations                  - Set work and break minutes");
    info!("  POST /durations/:kind/:direction - Step a duration by 5 minutes");
    info!("  POST /groups/:name/toggle        - Toggle a site group");
    info!("  POST /sites, DELETE /sites/:site - Manage custom sites");
    info!("  POST /window/always-on-top       - Pin or unpin the timer window");
    info!("  GET  /status                     - Current session and diagnostics");
    info!("  GET  /health                     - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            match result {
                Ok(signal) => info!("Shutdown signal {} received", signal),
                Err(e) => tracing::error!("Failed to listen for signals: {}", e),
            }
        }
    }

    // Closes the mode change stream, so the controller drains its ledger queue
    state.shutdown().await;
    if let Err(e) = controller_task.await {
        tracing::error!("Session controller failed: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
