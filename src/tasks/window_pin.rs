//! Keeps the timer window above other windows

use std::{
    sync::{atomic::Ordering, Arc},
    time::Duration,
};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{services::WindowHandle, state::AppState};

/// Time given to the window to appear before the first lookup
pub const PIN_INITIAL_DELAY: Duration = Duration::from_millis(300);
pub const PIN_ATTEMPTS: u32 = 50;
pub const PIN_RETRY: Duration = Duration::from_millis(100);

/// Look for the window titled `title` and apply the configured always-on-top
/// flag to it. Gives up quietly when no window shows up.
pub async fn window_pin_task(state: Arc<AppState>, title: String) -> Option<WindowHandle> {
    sleep(PIN_INITIAL_DELAY).await;

    for attempt in 1..=PIN_ATTEMPTS {
        let handle = state.window.find_window_by_title(&title);
        if handle != 0 {
            debug!("Found window {:?} after {} attempts", title, attempt);
            state.window_handle.store(handle, Ordering::SeqCst);

            let enabled = state.always_on_top.load(Ordering::SeqCst);
            match state.window.set_always_on_top(handle, enabled) {
                Ok(()) => info!("Window {:#x} always on top: {}", handle, enabled),
                Err(e) => {
                    warn!("Failed to pin window: {}", e);
                    if let Err(e) = state.add_error(format!("Window pin failed: {}", e)) {
                        warn!("Failed to add window error: {}", e);
                    }
                }
            }
            return Some(handle);
        }
        sleep(PIN_RETRY).await;
    }

    info!("No window titled {:?} found, running without pinning", title);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DurationSettings,
        services::{desktop::testing::FakeWindowManager, HostLedger},
        state::{BlockSelection, SessionTimer},
    };

    fn test_state(window: Arc<FakeWindowManager>) -> Arc<AppState> {
        let (timer, _streams) = SessionTimer::new(Duration::from_secs(60), Duration::from_secs(30));
        Arc::new(
            AppState::new(
                timer,
                HostLedger::new("/nonexistent/hosts", "nuisance"),
                DurationSettings::default(),
                BlockSelection::new(),
            )
            .with_window_manager(window),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_pins_window_once_it_appears() {
        let window = Arc::new(FakeWindowManager {
            appears_after: 5,
            ..Default::default()
        });
        let state = test_state(window.clone());

        assert_eq!(window_pin_task(Arc::clone(&state), "Nuisance".to_string()).await, Some(0x42));
        assert_eq!(*window.lookups.lock().unwrap(), 6);
        assert_eq!(*window.pinned.lock().unwrap(), vec![(0x42, true)]);
        assert_eq!(state.window_handle(), Some(0x42));

        state.set_always_on_top(false).await.unwrap();
        assert_eq!(window.pinned.lock().unwrap().last(), Some(&(0x42, false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_all_attempts() {
        let window = Arc::new(FakeWindowManager::default());
        let state = test_state(window.clone());

        assert_eq!(window_pin_task(Arc::clone(&state), "Elsewhere".to_string()).await, None);
        assert_eq!(*window.lookups.lock().unwrap(), PIN_ATTEMPTS as usize);
        assert!(window.pinned.lock().unwrap().is_empty());
        assert_eq!(state.window_handle(), None);
    }
}
