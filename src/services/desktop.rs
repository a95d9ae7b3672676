//! Desktop collaborators: audio cues and window pinning
//!
//! The actual OS calls live outside this crate. These traits describe what the
//! session needs from them; the bundled implementations only log.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Interval between repetitions of an alarm sound
pub const ALARM_REPEAT: Duration = Duration::from_secs(2);

/// Sound cues played on session events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundEvent {
    WorkStart,
    BreakStart,
    Complete,
    WorkAlarm,
    BreakAlarm,
    Button,
}

impl SoundEvent {
    /// Sound file conventionally shipped for this event
    pub fn file_name(self) -> &'static str {
        match self {
            SoundEvent::WorkStart | SoundEvent::WorkAlarm => "work_alarm.mp3",
            SoundEvent::BreakStart | SoundEvent::BreakAlarm => "break_alarm.mp3",
            SoundEvent::Complete => "complete.mp3",
            SoundEvent::Button => "button.mp3",
        }
    }
}

/// Audio output. `play` must return promptly and swallow its own failures.
pub trait SoundPlayer: Send + Sync + std::fmt::Debug {
    fn play(&self, event: SoundEvent);
}

/// Player that records cues in the log instead of making noise
#[derive(Debug, Default)]
pub struct LogSoundPlayer;

impl SoundPlayer for LogSoundPlayer {
    fn play(&self, event: SoundEvent) {
        debug!("Playing sound {}", event.file_name());
    }
}

/// Repeats an alarm cue until stopped
#[derive(Debug)]
pub struct AlarmPlayer {
    player: Arc<dyn SoundPlayer>,
    repeat: Duration,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl AlarmPlayer {
    pub fn new(player: Arc<dyn SoundPlayer>) -> Self {
        Self::with_repeat(player, ALARM_REPEAT)
    }

    pub fn with_repeat(player: Arc<dyn SoundPlayer>, repeat: Duration) -> Self {
        Self {
            player,
            repeat,
            stop_tx: Mutex::new(None),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.stop_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Start repeating `event`. Does nothing while an alarm is already playing.
    pub fn start(&self, event: SoundEvent) {
        let mut slot = self.stop_tx.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return;
        }

        let (stop_tx, mut stop_rx) = oneshot::channel();
        *slot = Some(stop_tx);

        let player = Arc::clone(&self.player);
        let mut interval = tokio::time::interval(self.repeat);
        info!("Alarm started: {:?}", event);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => player.play(event),
                }
            }
        });
    }

    /// Silence the alarm. Safe to call when nothing is playing.
    pub fn stop(&self) {
        let taken = self.stop_tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(stop_tx) = taken {
            if stop_tx.send(()).is_ok() {
                info!("Alarm stopped");
            }
        }
    }
}

/// Native window identifier, 0 when no window was found
pub type WindowHandle = usize;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window {0:#x} is no longer valid")]
    InvalidHandle(WindowHandle),
    #[error("window manager call failed: {0}")]
    Platform(String),
}

/// Window manager capability used to keep the timer window on top
pub trait WindowManager: Send + Sync + std::fmt::Debug {
    /// Look up a top-level window by its title. Returns 0 if none matches.
    fn find_window_by_title(&self, title: &str) -> WindowHandle;

    fn set_always_on_top(&self, handle: WindowHandle, enabled: bool) -> Result<(), WindowError>;
}

/// Window manager for runs without a desktop session
#[derive(Debug, Default)]
pub struct HeadlessWindowManager;

impl WindowManager for HeadlessWindowManager {
    fn find_window_by_title(&self, _title: &str) -> WindowHandle {
        0
    }

    fn set_always_on_top(&self, handle: WindowHandle, _enabled: bool) -> Result<(), WindowError> {
        Err(WindowError::InvalidHandle(handle))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSoundPlayer;
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_alarm_repeats_until_stopped() {
        let recorder = Arc::new(RecordingSoundPlayer::default());
        let alarm = AlarmPlayer::new(recorder.clone());

        alarm.start(SoundEvent::WorkAlarm);
        alarm.start(SoundEvent::BreakAlarm);
        assert!(alarm.is_playing());

        tokio::time::sleep(Duration::from_millis(4500)).await;
        alarm.stop();
        alarm.stop();
        assert!(!alarm.is_playing());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(recorder.played(), vec![SoundEvent::WorkAlarm; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_alarm_can_restart_after_stop() {
        let recorder = Arc::new(RecordingSoundPlayer::default());
        let alarm = AlarmPlayer::new(recorder.clone());

        alarm.start(SoundEvent::WorkAlarm);
        tokio::task::yield_now().await;
        alarm.stop();
        alarm.start(SoundEvent::BreakAlarm);
        tokio::time::sleep(Duration::from_millis(100)).await;
        alarm.stop();

        assert_eq!(recorder.played(), vec![SoundEvent::WorkAlarm, SoundEvent::BreakAlarm]);
    }

    #[test]
    fn test_headless_manager_finds_nothing() {
        let manager = HeadlessWindowManager;
        assert_eq!(manager.find_window_by_title("Nuisance"), 0);
        assert!(manager.set_always_on_top(0, true).is_err());
    }
}
