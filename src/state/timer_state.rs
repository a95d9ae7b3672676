//! Focus session state machine
//!
//! Pure transition logic for the work/break countdown. Nothing here touches
//! the clock or spawns tasks; `SessionTimer` drives it once per second and
//! publishes what it returns.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of a single countdown step
pub const TICK: Duration = Duration::from_secs(1);

/// Current phase of a focus session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Idle,
    Work,
    Break,
    Paused,
    /// Work countdown finished, waiting for acknowledgement before the break
    WorkAlarm,
    /// Break countdown finished, waiting for acknowledgement before going idle
    BreakAlarm,
}

impl Mode {
    /// Whether the countdown advances in this mode
    pub fn is_running(self) -> bool {
        matches!(self, Mode::Work | Mode::Break)
    }

    pub fn is_alarm(self) -> bool {
        matches!(self, Mode::WorkAlarm | Mode::BreakAlarm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Work => "work",
            Mode::Break => "break",
            Mode::Paused => "paused",
            Mode::WorkAlarm => "work_alarm",
            Mode::BreakAlarm => "break_alarm",
        }
    }

    /// Human readable label shown next to the countdown
    pub fn label(self) -> &'static str {
        match self {
            Mode::Idle => "Ready",
            Mode::Work => "Work Time",
            Mode::Break => "Break Time",
            Mode::Paused => "Paused",
            Mode::WorkAlarm => "Work Complete - Press Start for Break",
            Mode::BreakAlarm => "Break Complete - Press Start for Work",
        }
    }
}

/// A mode transition, delivered to subscribers without loss
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChange {
    pub from: Mode,
    pub to: Mode,
    /// Remaining countdown right after the transition
    pub remaining: Duration,
    pub at: DateTime<Utc>,
}

/// A countdown update, delivered to subscribers on a best-effort basis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub mode: Mode,
    pub remaining: Duration,
}

/// Result of advancing the countdown by one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub tick: Tick,
    pub change: Option<ModeChange>,
}

/// Timer state: mode, configured durations and the frozen or running countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    mode: Mode,
    previous_mode: Option<Mode>,
    work_duration: Duration,
    break_duration: Duration,
    remaining: Duration,
    /// Bumped every time a countdown run begins so stale ticks can be told apart
    run_id: u64,
}

impl TimerState {
    /// Create an idle timer. Zero durations fall back to a single tick.
    pub fn new(work_duration: Duration, break_duration: Duration) -> Self {
        Self {
            mode: Mode::Idle,
            previous_mode: None,
            work_duration: work_duration.max(TICK),
            break_duration: break_duration.max(TICK),
            remaining: Duration::ZERO,
            run_id: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Mode interrupted by the current pause, if any
    pub fn previous_mode(&self) -> Option<Mode> {
        self.previous_mode
    }

    pub fn work_duration(&self) -> Duration {
        self.work_duration
    }

    pub fn break_duration(&self) -> Duration {
        self.break_duration
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Countdown value to display: the full work duration while idle
    pub fn display_remaining(&self) -> Duration {
        if self.mode == Mode::Idle {
            self.work_duration
        } else {
            self.remaining
        }
    }

    /// Idle -> Work
    pub fn start(&mut self) -> Option<ModeChange> {
        if self.mode != Mode::Idle {
            return None;
        }
        self.remaining = self.work_duration;
        Some(self.enter(Mode::Work))
    }

    /// Work|Break -> Paused, freezing the countdown
    pub fn pause(&mut self) -> Option<ModeChange> {
        if !self.mode.is_running() {
            return None;
        }
        self.previous_mode = Some(self.mode);
        Some(self.enter(Mode::Paused))
    }

    /// Paused -> the mode that was interrupted
    pub fn resume(&mut self) -> Option<ModeChange> {
        if self.mode != Mode::Paused {
            return None;
        }
        let target = self.previous_mode.take()?;
        Some(self.enter(target))
    }

    /// WorkAlarm -> Break, BreakAlarm -> Idle
    pub fn acknowledge(&mut self) -> Option<ModeChange> {
        match self.mode {
            Mode::WorkAlarm => {
                self.remaining = self.break_duration;
                Some(self.enter(Mode::Break))
            }
            Mode::BreakAlarm => Some(self.stop_unchecked()),
            _ => None,
        }
    }

    /// Any mode -> Idle. No-op when already idle.
    pub fn stop(&mut self) -> Option<ModeChange> {
        if self.mode == Mode::Idle {
            return None;
        }
        Some(self.stop_unchecked())
    }

    /// Change durations for future cycles. The running countdown is left alone;
    /// zero values are ignored.
    pub fn update_durations(&mut self, work_duration: Duration, break_duration: Duration) {
        if !work_duration.is_zero() {
            self.work_duration = work_duration;
        }
        if !break_duration.is_zero() {
            self.break_duration = break_duration;
        }
    }

    /// Advance the countdown by one tick on behalf of run `run_id`.
    ///
    /// Returns `None` when the run is stale or the timer is not counting down.
    /// Reaching zero moves Work to WorkAlarm and Break to BreakAlarm.
    pub fn tick(&mut self, run_id: u64) -> Option<TickOutcome> {
        if run_id != self.run_id || !self.mode.is_running() {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(TICK);
        let tick = Tick {
            mode: self.mode,
            remaining: self.remaining,
        };

        let change = if self.remaining.is_zero() {
            let alarm = match self.mode {
                Mode::Work => Mode::WorkAlarm,
                _ => Mode::BreakAlarm,
            };
            Some(self.enter(alarm))
        } else {
            None
        };

        Some(TickOutcome { tick, change })
    }

    fn stop_unchecked(&mut self) -> ModeChange {
        self.remaining = Duration::ZERO;
        self.previous_mode = None;
        self.enter(Mode::Idle)
    }

    fn enter(&mut self, to: Mode) -> ModeChange {
        let from = self.mode;
        self.mode = to;
        if to.is_running() {
            self.run_id += 1;
        }
        ModeChange {
            from,
            to,
            remaining: self.remaining,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn run_ticks(state: &mut TimerState, n: u64) -> Vec<ModeChange> {
        let mut changes = Vec::new();
        for _ in 0..n {
            let run_id = state.run_id();
            if let Some(change) = state.tick(run_id).and_then(|o| o.change) {
                changes.push(change);
            }
        }
        changes
    }

    #[test]
    fn test_full_cycle_with_acknowledgements() {
        for (w, b) in [(1, 1), (3, 2), (25, 5)] {
            let mut state = TimerState::new(secs(w), secs(b));

            let change = state.start().unwrap();
            assert_eq!((change.from, change.to), (Mode::Idle, Mode::Work));
            assert_eq!(state.remaining(), secs(w));

            let changes = run_ticks(&mut state, w);
            assert_eq!(changes.len(), 1);
            assert_eq!(changes[0].to, Mode::WorkAlarm);
            assert_eq!(state.remaining(), Duration::ZERO);

            state.acknowledge().unwrap();
            assert_eq!(state.mode(), Mode::Break);
            assert_eq!(state.remaining(), secs(b));

            let changes = run_ticks(&mut state, b);
            assert_eq!(changes.len(), 1);
            assert_eq!(changes[0].to, Mode::BreakAlarm);

            let change = state.acknowledge().unwrap();
            assert_eq!((change.from, change.to), (Mode::BreakAlarm, Mode::Idle));
            assert_eq!(state.remaining(), Duration::ZERO);
        }
    }

    #[test]
    fn test_alarm_does_not_tick() {
        let mut state = TimerState::new(secs(1), secs(1));
        state.start();
        run_ticks(&mut state, 1);
        assert_eq!(state.mode(), Mode::WorkAlarm);
        assert!(state.tick(state.run_id()).is_none());
        assert_eq!(state.mode(), Mode::WorkAlarm);
    }

    #[test]
    fn test_pause_resume_preserves_remaining_and_mode() {
        let mut state = TimerState::new(secs(10), secs(4));
        state.start();
        run_ticks(&mut state, 3);

        state.pause().unwrap();
        assert_eq!(state.mode(), Mode::Paused);
        assert_eq!(state.previous_mode(), Some(Mode::Work));
        assert_eq!(state.remaining(), secs(7));

        state.resume().unwrap();
        assert_eq!(state.mode(), Mode::Work);
        assert_eq!(state.remaining(), secs(7));

        run_ticks(&mut state, 7);
        state.acknowledge();
        run_ticks(&mut state, 1);
        state.pause().unwrap();
        state.resume().unwrap();
        assert_eq!(state.mode(), Mode::Break);
        assert_eq!(state.remaining(), secs(3));
    }

    #[test]
    fn test_invalid_transitions_are_noops() {
        let mut state = TimerState::new(secs(10), secs(5));
        assert!(state.pause().is_none());
        assert!(state.resume().is_none());
        assert!(state.acknowledge().is_none());
        assert!(state.stop().is_none());
        assert_eq!(state.mode(), Mode::Idle);

        state.start();
        assert!(state.start().is_none());
        assert!(state.resume().is_none());
        assert!(state.acknowledge().is_none());
        assert_eq!(state.mode(), Mode::Work);
        assert_eq!(state.remaining(), secs(10));
    }

    #[test]
    fn test_stop_from_every_mode() {
        let mut state = TimerState::new(secs(2), secs(2));
        state.start();
        state.pause();
        let change = state.stop().unwrap();
        assert_eq!((change.from, change.to), (Mode::Paused, Mode::Idle));
        assert_eq!(state.remaining(), Duration::ZERO);
        assert_eq!(state.previous_mode(), None);

        state.start();
        run_ticks(&mut state, 2);
        assert_eq!(state.stop().unwrap().from, Mode::WorkAlarm);
        assert!(state.stop().is_none());
    }

    #[test]
    fn test_stale_run_is_ignored() {
        let mut state = TimerState::new(secs(10), secs(5));
        state.start();
        let stale = state.run_id();
        state.pause();
        state.resume();
        assert_ne!(stale, state.run_id());
        assert!(state.tick(stale).is_none());
        assert_eq!(state.remaining(), secs(10));
    }

    #[test]
    fn test_update_durations_while_idle_changes_display() {
        let mut state = TimerState::new(secs(25 * 60), secs(5 * 60));
        assert_eq!(state.display_remaining(), secs(25 * 60));
        state.update_durations(secs(30 * 60), secs(10 * 60));
        assert_eq!(state.display_remaining(), secs(30 * 60));
        state.start();
        assert_eq!(state.remaining(), secs(30 * 60));
    }

    #[test]
    fn test_update_durations_while_running_keeps_countdown() {
        let mut state = TimerState::new(secs(10), secs(5));
        state.start();
        run_ticks(&mut state, 4);
        state.update_durations(secs(2), secs(1));
        assert_eq!(state.remaining(), secs(6));

        run_ticks(&mut state, 6);
        assert_eq!(state.mode(), Mode::WorkAlarm);
        state.acknowledge();
        assert_eq!(state.remaining(), secs(1));
    }

    #[test]
    fn test_zero_durations_are_ignored() {
        let mut state = TimerState::new(Duration::ZERO, secs(5));
        assert_eq!(state.work_duration(), TICK);
        state.update_durations(Duration::ZERO, Duration::ZERO);
        assert_eq!(state.work_duration(), TICK);
        assert_eq!(state.break_duration(), secs(5));
    }
}
