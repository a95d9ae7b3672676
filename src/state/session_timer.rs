//! Session timer handle
//!
//! Wraps `TimerState` behind a mutex, owns the per-run tick task and the two
//! outgoing streams:
//! - `updates`: bounded and lossy. When the buffer is full the newest update is
//!   dropped, the timer never waits on a slow reader.
//! - `mode_changes`: unbounded, every transition is delivered.
//!
//! Entering a running mode spawns the tick task on the current tokio runtime.
//! Outside a runtime the transition still happens but the countdown stays
//! frozen.

use std::{
    sync::{Arc, Mutex, MutexGuard, Once, PoisonError},
    time::Duration,
};
use tokio::{
    runtime::Handle,
    sync::{mpsc, oneshot},
};
use tracing::{debug, info, warn};

use super::timer_state::{Mode, ModeChange, Tick, TimerState};
use crate::tasks::run_tick_loop;

/// Capacity of the lossy tick stream
pub const UPDATE_BUFFER: usize = 10;

/// Receiving ends of the timer's event streams
#[derive(Debug)]
pub struct TimerStreams {
    pub updates: mpsc::Receiver<Tick>,
    pub mode_changes: mpsc::UnboundedReceiver<ModeChange>,
}

#[derive(Debug)]
struct Inner {
    state: TimerState,
    /// Cancels the active tick task. A fresh channel is created for every run.
    cancel: Option<oneshot::Sender<()>>,
    updates_tx: Option<mpsc::Sender<Tick>>,
    mode_tx: Option<mpsc::UnboundedSender<ModeChange>>,
}

impl Inner {
    fn closed(&self) -> bool {
        self.mode_tx.is_none()
    }

    fn cancel_run(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    fn publish_tick(&self, tick: Tick) {
        let Some(tx) = &self.updates_tx else {
            return;
        };
        match tx.try_send(tick) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                debug!("Update buffer full, dropping tick at {}s", dropped.remaining.as_secs());
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    fn publish_change(&self, change: ModeChange) {
        if let Some(tx) = &self.mode_tx {
            // Unbounded send only fails once every receiver is gone
            let _ = tx.send(change);
        }
    }
}

#[derive(Debug)]
struct Shared {
    inner: Mutex<Inner>,
    shutdown: Once,
}

/// Cloneable handle to the focus session timer
#[derive(Debug, Clone)]
pub struct SessionTimer {
    shared: Arc<Shared>,
}

impl SessionTimer {
    /// Create an idle timer and the receivers for its event streams
    pub fn new(work_duration: Duration, break_duration: Duration) -> (Self, TimerStreams) {
        let (updates_tx, updates) = mpsc::channel(UPDATE_BUFFER);
        let (mode_tx, mode_changes) = mpsc::unbounded_channel();

        let timer = Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: TimerState::new(work_duration, break_duration),
                    cancel: None,
                    updates_tx: Some(updates_tx),
                    mode_tx: Some(mode_tx),
                }),
                shutdown: Once::new(),
            }),
        };

        (timer, TimerStreams { updates, mode_changes })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // TimerState is only mutated through whole transitions, so a poisoned
        // guard still holds a consistent value.
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> TimerState {
        self.lock().state.clone()
    }

    pub fn mode(&self) -> Mode {
        self.lock().state.mode()
    }

    pub fn start(&self) -> Option<ModeChange> {
        self.apply("start", TimerState::start)
    }

    pub fn pause(&self) -> Option<ModeChange> {
        self.apply("pause", TimerState::pause)
    }

    pub fn resume(&self) -> Option<ModeChange> {
        self.apply("resume", TimerState::resume)
    }

    pub fn acknowledge(&self) -> Option<ModeChange> {
        self.apply("acknowledge", TimerState::acknowledge)
    }

    /// Return to Idle from any mode. Safe to call when already idle.
    pub fn stop(&self) -> Option<ModeChange> {
        self.apply("stop", TimerState::stop)
    }

    /// Change durations for future cycles. While idle the new ready value is
    /// published on the update stream straight away.
    pub fn update_durations(&self, work_duration: Duration, break_duration: Duration) {
        let mut inner = self.lock();
        if inner.closed() {
            return;
        }
        inner.state.update_durations(work_duration, break_duration);
        info!(
            "Durations updated: work={}s, break={}s",
            inner.state.work_duration().as_secs(),
            inner.state.break_duration().as_secs()
        );

        if inner.state.mode() == Mode::Idle {
            let tick = Tick {
                mode: Mode::Idle,
                remaining: inner.state.display_remaining(),
            };
            inner.publish_tick(tick);
        }
    }

    /// Stop ticking and close both streams. Only the first call has any effect.
    pub fn shutdown(&self) {
        self.shared.shutdown.call_once(|| {
            let mut inner = self.lock();
            inner.cancel_run();
            if let Some(change) = inner.state.stop() {
                inner.publish_change(change);
            }
            inner.updates_tx = None;
            inner.mode_tx = None;
            info!("Session timer shut down");
        });
    }

    fn apply<F>(&self, operation: &str, transition: F) -> Option<ModeChange>
    where
        F: FnOnce(&mut TimerState) -> Option<ModeChange>,
    {
        let mut inner = self.lock();
        if inner.closed() {
            debug!("Ignoring {} after shutdown", operation);
            return None;
        }

        let Some(change) = transition(&mut inner.state) else {
            debug!("Ignoring {} in {} mode", operation, inner.state.mode().as_str());
            return None;
        };

        info!(
            "Timer {}: {} -> {} ({}s remaining)",
            operation,
            change.from.as_str(),
            change.to.as_str(),
            change.remaining.as_secs()
        );

        // Every transition ends the previous run; entering Work or Break begins a new one
        inner.cancel_run();
        if change.to.is_running() {
            let (cancel_tx, cancel_rx) = oneshot::channel();
            inner.cancel = Some(cancel_tx);
            match Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(run_tick_loop(self.clone(), inner.state.run_id(), cancel_rx));
                }
                Err(e) => warn!("No tokio runtime, countdown will not advance: {}", e),
            }
        }

        let tick = Tick {
            mode: change.to,
            remaining: inner.state.display_remaining(),
        };
        inner.publish_change(change.clone());
        inner.publish_tick(tick);

        Some(change)
    }

    /// Advance the countdown for run `run_id`. Returns whether the run should
    /// keep ticking.
    pub(crate) fn tick(&self, run_id: u64) -> bool {
        let mut inner = self.lock();
        let Some(outcome) = inner.state.tick(run_id) else {
            return false;
        };

        debug!("Tick: {} {}s", outcome.tick.mode.as_str(), outcome.tick.remaining.as_secs());
        inner.publish_tick(outcome.tick);

        if let Some(change) = outcome.change {
            info!("Countdown finished: {} -> {}", change.from.as_str(), change.to.as_str());
            inner.cancel = None;
            inner.publish_change(change);
        }

        inner.state.mode().is_running()
    }
}
