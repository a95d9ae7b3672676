//! Background task applying hosts file changes in order

use std::sync::{atomic::Ordering, Arc};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::state::AppState;

/// A requested hosts file change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerJob {
    /// Make sure every listed site has a block entry
    Block(Vec<String>),
    /// Remove every block entry
    Unblock,
}

impl LedgerJob {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerJob::Block(_) => "block",
            LedgerJob::Unblock => "unblock",
        }
    }
}

/// Apply jobs one at a time, in the order they were queued.
///
/// File I/O runs on the blocking pool so a slow or hung write only stalls this
/// worker. Failures are logged and recorded in the diagnostics; they never
/// reach the timer. A failed block clears the blocking flag.
pub async fn ledger_worker_task(state: Arc<AppState>, mut jobs: mpsc::UnboundedReceiver<LedgerJob>) {
    info!("Starting ledger worker for {}", state.ledger.path().display());

    while let Some(job) = jobs.recv().await {
        let name = job.name();
        let is_block = matches!(job, LedgerJob::Block(_));
        let ledger = Arc::clone(&state.ledger);

        let result = tokio::task::spawn_blocking(move || match job {
            LedgerJob::Block(sites) => {
                ledger.set_sites(sites);
                ledger.add_block_entries()
            }
            LedgerJob::Unblock => ledger.remove_block_entries(),
        })
        .await;

        let failure = match result {
            Ok(Ok(changed)) => {
                debug!("Ledger {} done, {} lines changed", name, changed);
                if let Err(e) = state.clear_errors_for("ledger") {
                    error!("Failed to clear ledger errors: {}", e);
                }
                continue;
            }
            Ok(Err(e)) => format!("Ledger {} failed: {}", name, e),
            Err(e) => format!("Ledger {} task failed: {}", name, e),
        };

        error!("{}", failure);
        if is_block {
            state.blocking.store(false, Ordering::SeqCst);
        }
        if let Err(e) = state.add_error(failure) {
            error!("Failed to add ledger error: {}", e);
        }
    }

    info!("Ledger worker stopped");
}
