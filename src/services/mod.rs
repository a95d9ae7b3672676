//! External resource management module
//!
//! This module contains the hosts file ledger and the desktop collaborators
//! (sound, window manager) the session talks to.

pub mod desktop;
pub mod hosts;

// Re-export main types
pub use desktop::{
    AlarmPlayer, HeadlessWindowManager, LogSoundPlayer, SoundEvent, SoundPlayer, WindowError,
    WindowHandle, WindowManager,
};
pub use hosts::{HostLedger, LedgerError, BLOCK_ADDRESS};
