//! Main application state management

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Instant,
};
use tracing::{info, warn};

use super::{
    BlockSelection, Diagnostics, Mode, ModeChange, SessionTimer, SiteGroup, Tick, TimerStreams,
};
use crate::{
    config::{Config, DurationSettings},
    services::{
        HeadlessWindowManager, HostLedger, LogSoundPlayer, SoundPlayer, WindowHandle, WindowManager,
    },
};

/// Which configured duration an adjustment applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationKind {
    Work,
    Break,
}

/// Shared state behind the control API and the background tasks
#[derive(Debug)]
pub struct AppState {
    pub timer: SessionTimer,
    pub ledger: Arc<HostLedger>,
    pub selection: Mutex<BlockSelection>,
    pub durations: Mutex<DurationSettings>,
    pub diagnostics: Mutex<Diagnostics>,
    /// Collaborators
    pub sound: Arc<dyn SoundPlayer>,
    pub window: Arc<dyn WindowManager>,
    pub window_handle: AtomicUsize,
    pub always_on_top: AtomicBool,
    /// Whether block entries were last requested to be present
    pub blocking: AtomicBool,
    /// Latest countdown update seen on the lossy stream
    pub last_tick: Mutex<Option<Tick>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    shut_down: AtomicBool,
}

impl AppState {
    /// Create state around an existing timer and ledger, with logging-only
    /// collaborators
    pub fn new(
        timer: SessionTimer,
        ledger: HostLedger,
        durations: DurationSettings,
        selection: BlockSelection,
    ) -> Self {
        Self {
            timer,
            ledger: Arc::new(ledger),
            selection: Mutex::new(selection),
            durations: Mutex::new(durations),
            diagnostics: Mutex::new(Diagnostics::new()),
            sound: Arc::new(LogSoundPlayer),
            window: Arc::new(HeadlessWindowManager),
            window_handle: AtomicUsize::new(0),
            always_on_top: AtomicBool::new(true),
            blocking: AtomicBool::new(false),
            last_tick: Mutex::new(None),
            start_time: Instant::now(),
            port: 0,
            host: String::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Build the timer, ledger and selection described by `config`
    pub fn from_config(config: &Config) -> (Self, TimerStreams) {
        let durations = config.durations();
        let (timer, streams) = SessionTimer::new(durations.work(), durations.break_duration());
        let ledger = HostLedger::new(config.hosts_file.clone(), config.token.clone());

        let state = Self::new(timer, ledger, durations, config.selection())
            .with_address(config.host.clone(), config.port);
        (state, streams)
    }

    pub fn with_address(mut self, host: String, port: u16) -> Self {
        self.host = host;
        self.port = port;
        self
    }

    pub fn with_sound(mut self, sound: Arc<dyn SoundPlayer>) -> Self {
        self.sound = sound;
        self
    }

    pub fn with_window_manager(mut self, window: Arc<dyn WindowManager>) -> Self {
        self.window = window;
        self
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut diagnostics) = self.diagnostics.lock() {
            diagnostics.record_action(action);
        }
    }

    /// The single start button: resumes a pause, starts from idle and
    /// acknowledges an alarm
    pub fn press_start(&self) -> Option<ModeChange> {
        self.record_action("start");
        if self.timer.mode() == Mode::Paused {
            self.timer.resume()
        } else if self.timer.mode().is_alarm() {
            self.timer.acknowledge()
        } else {
            self.timer.start()
        }
    }

    pub fn pause(&self) -> Option<ModeChange> {
        self.record_action("pause");
        self.timer.pause()
    }

    pub fn resume(&self) -> Option<ModeChange> {
        self.record_action("resume");
        self.timer.resume()
    }

    pub fn acknowledge(&self) -> Option<ModeChange> {
        self.record_action("acknowledge");
        self.timer.acknowledge()
    }

    pub fn reset(&self) -> Option<ModeChange> {
        self.record_action("reset");
        self.timer.stop()
    }

    /// Current duration settings
    pub fn get_durations(&self) -> Result<DurationSettings, String> {
        self.durations
            .lock()
            .map(|durations| *durations)
            .map_err(|e| format!("Failed to lock durations: {}", e))
    }

    /// Replace either duration and push the result to the timer
    pub fn set_durations(
        &self,
        work_minutes: Option<u64>,
        break_minutes: Option<u64>,
    ) -> Result<DurationSettings, String> {
        self.update_durations("set-durations", |durations| {
            if let Some(minutes) = work_minutes {
                durations.set_work_minutes(minutes);
            }
            if let Some(minutes) = break_minutes {
                durations.set_break_minutes(minutes);
            }
            true
        })
    }

    /// Step a duration up or down. The flag is false when the bound was hit.
    pub fn adjust_duration(
        &self,
        kind: DurationKind,
        increase: bool,
    ) -> Result<(DurationSettings, bool), String> {
        let mut changed = false;
        let durations = self.update_durations("adjust-duration", |durations| {
            changed = match (kind, increase) {
                (DurationKind::Work, true) => durations.increase_work(),
                (DurationKind::Work, false) => durations.decrease_work(),
                (DurationKind::Break, true) => durations.increase_break(),
                (DurationKind::Break, false) => durations.decrease_break(),
            };
            changed
        })?;
        Ok((durations, changed))
    }

    fn update_durations<F>(&self, action: &str, updater: F) -> Result<DurationSettings, String>
    where
        F: FnOnce(&mut DurationSettings) -> bool,
    {
        let mut durations = self.durations.lock()
            .map_err(|e| format!("Failed to lock durations: {}", e))?;

        let changed = updater(&mut *durations);
        let new_durations = *durations;
        drop(durations);

        self.record_action(action);
        if changed {
            self.timer.update_durations(new_durations.work(), new_durations.break_duration());
        }
        Ok(new_durations)
    }

    /// Copy of the blocking configuration
    pub fn get_selection(&self) -> Result<BlockSelection, String> {
        self.selection
            .lock()
            .map(|selection| selection.clone())
            .map_err(|e| format!("Failed to lock site selection: {}", e))
    }

    /// Hostnames the next work interval will block
    pub fn blocked_sites(&self) -> Result<Vec<String>, String> {
        self.get_selection().map(|selection| selection.sites())
    }

    fn update_selection<F, T>(&self, action: &str, updater: F) -> Result<T, String>
    where
        F: FnOnce(&mut BlockSelection) -> T,
    {
        let mut selection = self.selection.lock()
            .map_err(|e| format!("Failed to lock site selection: {}", e))?;
        let result = updater(&mut *selection);
        drop(selection);

        self.record_action(action);
        Ok(result)
    }

    /// Flip a site group. Takes effect at the next work interval.
    pub fn toggle_group(&self, group: SiteGroup) -> Result<bool, String> {
        let enabled = self.update_selection("toggle-group", |selection| selection.toggle(group))?;
        info!("Site group {} {}", group.as_str(), if enabled { "enabled" } else { "disabled" });
        Ok(enabled)
    }

    pub fn add_site(&self, site: &str) -> Result<Option<String>, String> {
        let added = self.update_selection("add-site", |selection| selection.add_custom(site))?;
        if let Some(site) = &added {
            info!("Custom site added: {}", site);
        }
        Ok(added)
    }

    pub fn remove_site(&self, site: &str) -> Result<bool, String> {
        self.update_selection("remove-site", |selection| selection.remove_custom(site))
    }

    /// Add an error for clients to see
    pub fn add_error(&self, error: String) -> Result<(), String> {
        let mut diagnostics = self.diagnostics.lock()
            .map_err(|e| format!("Failed to lock diagnostics: {}", e))?;

        warn!("Adding error to state: {}", error);
        diagnostics.add_error(error);
        Ok(())
    }

    /// Clear errors for a specific component
    pub fn clear_errors_for(&self, component: &str) -> Result<(), String> {
        let mut diagnostics = self.diagnostics.lock()
            .map_err(|e| format!("Failed to lock diagnostics: {}", e))?;
        diagnostics.clear_errors_for(component);
        Ok(())
    }

    pub fn get_diagnostics(&self) -> Result<Diagnostics, String> {
        self.diagnostics
            .lock()
            .map(|diagnostics| diagnostics.clone())
            .map_err(|e| format!("Failed to lock diagnostics: {}", e))
    }

    pub fn get_last_tick(&self) -> Option<Tick> {
        self.last_tick.lock().ok().and_then(|tick| *tick)
    }

    pub fn set_last_tick(&self, tick: Tick) {
        if let Ok(mut last_tick) = self.last_tick.lock() {
            *last_tick = Some(tick);
        }
    }

    /// Window found by the pin task, if any
    pub fn window_handle(&self) -> Option<WindowHandle> {
        match self.window_handle.load(Ordering::SeqCst) {
            0 => None,
            handle => Some(handle),
        }
    }

    /// Pin or unpin the timer window. Fails when no window is known yet.
    pub async fn set_always_on_top(&self, enabled: bool) -> Result<(), String> {
        let handle = self.window_handle().ok_or_else(|| "Timer window not found".to_string())?;

        self.record_action(if enabled { "pin-window" } else { "unpin-window" });
        self.always_on_top.store(enabled, Ordering::SeqCst);

        let window = Arc::clone(&self.window);
        tokio::task::spawn_blocking(move || window.set_always_on_top(handle, enabled))
            .await
            .map_err(|e| format!("Window task failed: {}", e))?
            .map_err(|e| e.to_string())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Clear block entries left behind by an earlier run
    pub async fn startup_cleanup(&self) {
        let ledger = Arc::clone(&self.ledger);
        match tokio::task::spawn_blocking(move || ledger.remove_block_entries()).await {
            Ok(Ok(removed)) => info!("Startup cleanup removed {} stale entries", removed),
            Ok(Err(e)) => warn!("Startup cleanup skipped: {}", e),
            Err(e) => warn!("Startup cleanup task failed: {}", e),
        }
    }

    /// Stop the timer and remove every block entry. Runs once; later calls
    /// return immediately.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down focus session");

        self.timer.shutdown();
        self.blocking.store(false, Ordering::SeqCst);

        let ledger = Arc::clone(&self.ledger);
        match tokio::task::spawn_blocking(move || ledger.remove_block_entries()).await {
            Ok(Ok(removed)) => info!("Removed {} block entries on shutdown", removed),
            Ok(Err(e)) => warn!("Failed to remove block entries on shutdown: {}", e),
            Err(e) => warn!("Shutdown cleanup task failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_state(dir: &TempDir) -> (AppState, TimerStreams) {
        let durations = DurationSettings::default();
        let (timer, streams) = SessionTimer::new(durations.work(), durations.break_duration());
        let ledger = HostLedger::new(dir.path().join("hosts"), "nuisance");
        (AppState::new(timer, ledger, durations, BlockSelection::new()), streams)
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_start_follows_the_cycle() {
        let dir = TempDir::new().unwrap();
        let (state, _streams) = test_state(&dir);

        assert_eq!(state.press_start().unwrap().to, Mode::Work);
        state.pause();
        assert_eq!(state.press_start().unwrap().to, Mode::Work);
        assert!(state.press_start().is_none());

        tokio::time::sleep(Duration::from_secs(25 * 60 + 1)).await;
        assert_eq!(state.timer.mode(), Mode::WorkAlarm);
        assert_eq!(state.press_start().unwrap().to, Mode::Break);

        let diagnostics = state.get_diagnostics().unwrap();
        assert_eq!(diagnostics.last_action.as_deref(), Some("start"));
    }

    #[tokio::test]
    async fn test_adjusting_durations_updates_ready_value() {
        let dir = TempDir::new().unwrap();
        let (state, _streams) = test_state(&dir);

        let (durations, changed) = state.adjust_duration(DurationKind::Work, true).unwrap();
        assert!(changed);
        assert_eq!(durations.work_minutes(), 30);
        assert_eq!(state.timer.snapshot().display_remaining(), Duration::from_secs(30 * 60));

        let durations = state.set_durations(None, Some(100)).unwrap();
        assert_eq!(durations.break_minutes(), 30);
        assert_eq!(state.timer.snapshot().break_duration(), Duration::from_secs(30 * 60));

        let (_, changed) = state.adjust_duration(DurationKind::Break, true).unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn test_selection_changes() {
        let dir = TempDir::new().unwrap();
        let (state, _streams) = test_state(&dir);

        assert!(!state.toggle_group(SiteGroup::Facebook).unwrap());
        assert_eq!(state.add_site("news").unwrap(), Some("news.com".to_string()));
        assert_eq!(state.add_site("news.com").unwrap(), None);

        let sites = state.blocked_sites().unwrap();
        assert!(!sites.contains(&"facebook.com".to_string()));
        assert_eq!(sites.last().unwrap(), "news.com");

        assert!(state.remove_site("news.com").unwrap());
    }

    #[tokio::test]
    async fn test_always_on_top_requires_window() {
        let dir = TempDir::new().unwrap();
        let (state, _streams) = test_state(&dir);
        assert!(state.set_always_on_top(false).await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_runs_once() {
        let dir = TempDir::new().unwrap();
        let (state, mut streams) = test_state(&dir);
        std::fs::write(dir.path().join("hosts"), "127.0.0.1\tx.com\t# nuisance\r\n").unwrap();

        state.timer.start();
        state.shutdown().await;
        state.shutdown().await;

        assert_eq!(state.timer.mode(), Mode::Idle);
        assert_eq!(std::fs::read_to_string(dir.path().join("hosts")).unwrap(), "\r\n");

        let mut changes = 0;
        while streams.mode_changes.recv().await.is_some() {
            changes += 1;
        }
        assert_eq!(changes, 2);
    }
}
