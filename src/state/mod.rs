//! State management module
//!
//! This module contains the focus session state machine, the timer handle
//! that drives it and the shared application state.

pub mod app_state;
pub mod block_selection;
pub mod diagnostics;
pub mod session_timer;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, DurationKind};
pub use block_selection::{normalize_hostname, BlockSelection, SiteGroup};
pub use diagnostics::Diagnostics;
pub use session_timer::{SessionTimer, TimerStreams, UPDATE_BUFFER};
pub use timer_state::{Mode, ModeChange, Tick, TickOutcome, TimerState, TICK};
