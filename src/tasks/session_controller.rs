//! Session controller background task
//!
//! Reacts to timer mode changes: queues hosts file changes, plays sound cues
//! and drives the repeating alarm. Nothing here blocks the timer. Ledger work
//! is queued to the ledger worker and its failures only end up in the log and
//! the diagnostics.

use std::sync::{atomic::Ordering, Arc};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::ledger_worker::{ledger_worker_task, LedgerJob};
use crate::{
    services::{AlarmPlayer, SoundEvent},
    state::{AppState, Mode, ModeChange},
};

/// What a transition means for the hosts file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    Block,
    Unblock,
}

/// Ledger action for a transition.
///
/// Entries go in when work starts from idle. They come out whenever the
/// session reaches a break or idle, except when a break is merely resumed.
pub fn ledger_action(change: &ModeChange) -> Option<LedgerAction> {
    match (change.from, change.to) {
        (Mode::Idle, Mode::Work) => Some(LedgerAction::Block),
        (Mode::Paused, Mode::Work | Mode::Break) => None,
        (_, Mode::Break | Mode::Idle) => Some(LedgerAction::Unblock),
        _ => None,
    }
}

/// One-shot sound cue for a transition. Alarms are handled separately.
pub fn sound_cue(change: &ModeChange) -> Option<SoundEvent> {
    match (change.from, change.to) {
        (Mode::Idle, Mode::Work) => Some(SoundEvent::WorkStart),
        (Mode::WorkAlarm, Mode::Break) => Some(SoundEvent::BreakStart),
        (_, Mode::Idle) => Some(SoundEvent::Complete),
        _ => None,
    }
}

pub struct SessionController {
    state: Arc<AppState>,
    jobs: mpsc::UnboundedSender<LedgerJob>,
    worker: JoinHandle<()>,
    alarm: AlarmPlayer,
}

impl SessionController {
    /// Create the controller and spawn its ledger worker
    pub fn new(state: Arc<AppState>) -> Self {
        let (jobs, jobs_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(ledger_worker_task(Arc::clone(&state), jobs_rx));
        let alarm = AlarmPlayer::new(Arc::clone(&state.sound));

        Self {
            state,
            jobs,
            worker,
            alarm,
        }
    }

    /// Handle mode changes until the timer closes its stream, then wait for
    /// queued ledger work to finish
    pub async fn run(self, mut changes: mpsc::UnboundedReceiver<ModeChange>) {
        info!("Starting session controller");

        while let Some(change) = changes.recv().await {
            self.handle(&change);
        }

        info!("Mode change stream closed, stopping session controller");
        self.finish().await;
    }

    /// React to a single transition
    pub fn handle(&self, change: &ModeChange) {
        debug!("Controller received {} -> {}", change.from.as_str(), change.to.as_str());

        if change.from.is_alarm() {
            self.alarm.stop();
        }
        match change.to {
            Mode::WorkAlarm => self.alarm.start(SoundEvent::WorkAlarm),
            Mode::BreakAlarm => self.alarm.start(SoundEvent::BreakAlarm),
            _ => {}
        }
        if let Some(cue) = sound_cue(change) {
            self.state.sound.play(cue);
        }

        match ledger_action(change) {
            Some(LedgerAction::Block) => {
                // Sites are read now, so later selection changes wait for the next work interval
                let sites = match self.state.blocked_sites() {
                    Ok(sites) => sites,
                    Err(e) => {
                        error!("Failed to read blocked sites: {}", e);
                        return;
                    }
                };
                info!("Work started, blocking {} sites", sites.len());
                self.state.blocking.store(true, Ordering::SeqCst);
                self.enqueue(LedgerJob::Block(sites));
            }
            Some(LedgerAction::Unblock) => {
                info!("Work over, removing block entries");
                self.state.blocking.store(false, Ordering::SeqCst);
                self.enqueue(LedgerJob::Unblock);
            }
            None => {}
        }
    }

    fn enqueue(&self, job: LedgerJob) {
        if let Err(e) = self.jobs.send(job) {
            warn!("Ledger worker gone, dropping {} job", e.0.name());
        }
    }

    /// Silence the alarm and wait for the ledger worker to drain its queue
    pub async fn finish(self) {
        let Self {
            jobs, worker, alarm, ..
        } = self;

        alarm.stop();
        drop(jobs);
        if let Err(e) = worker.await {
            error!("Ledger worker failed: {}", e);
        }
    }
}
