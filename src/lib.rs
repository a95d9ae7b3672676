//! Nuisance - A focus session timer that blocks distracting sites while you work
//!
//! This library provides the work/break state machine, the hosts file ledger
//! that adds and removes tagged block entries, and the controller that keeps
//! the two in step, along with a small local HTTP control surface.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, SessionTimer};
pub use services::HostLedger;
pub use tasks::SessionController;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
