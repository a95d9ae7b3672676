//! Countdown display background task

use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::state::{AppState, Tick};

/// Format a remaining duration as MM:SS
pub fn format_clock(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Keep the latest countdown value for the status endpoint.
///
/// The update stream is lossy, so only the most recent value matters.
pub async fn countdown_display_task(state: Arc<AppState>, mut updates: mpsc::Receiver<Tick>) {
    info!("Starting countdown display task");

    while let Some(tick) = updates.recv().await {
        debug!("{} {}", tick.mode.label(), format_clock(tick.remaining));
        state.set_last_tick(tick);
    }

    info!("Countdown stream closed");
}
