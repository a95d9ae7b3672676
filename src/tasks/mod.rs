//! Background tasks module
//!
//! This module contains the tasks that run alongside the HTTP server: the
//! countdown loop, the session controller and its ledger worker, the display
//! consumer and the window pinning task.

pub mod countdown_display;
pub mod ledger_worker;
pub mod session_controller;
pub mod tick_loop;
pub mod window_pin;

// Re-export main functions
pub use countdown_display::{countdown_display_task, format_clock};
pub use ledger_worker::{ledger_worker_task, LedgerJob};
pub use session_controller::{ledger_action, LedgerAction, SessionController};
pub use tick_loop::run_tick_loop;
pub use window_pin::window_pin_task;
