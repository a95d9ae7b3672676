//! Per-run countdown task

use tokio::{
    sync::oneshot,
    time::{interval_at, Instant},
};
use tracing::debug;

use crate::state::{SessionTimer, TICK};

/// Tick `timer` once per second until the run ends or is cancelled.
///
/// The loop only waits on its interval and on `cancel`. Dropping the sender
/// cancels as well, so a replaced run never outlives its handle.
pub async fn run_tick_loop(timer: SessionTimer, run_id: u64, mut cancel: oneshot::Receiver<()>) {
    debug!("Starting tick loop for run {}", run_id);

    let mut interval = interval_at(Instant::now() + TICK, TICK);

    loop {
        tokio::select! {
            _ = &mut cancel => {
                debug!("Tick loop for run {} cancelled", run_id);
                break;
            }
            _ = interval.tick() => {
                if !timer.tick(run_id) {
                    debug!("Tick loop for run {} finished", run_id);
                    break;
                }
            }
        }
    }
}
