//! API response structures

use std::{collections::BTreeMap, sync::atomic::Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    state::{AppState, Mode, SiteGroup},
    tasks::format_clock,
};

/// Snapshot of the focus session returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub mode: Mode,
    pub label: String,
    pub remaining_seconds: u64,
    /// Countdown as shown on the timer, MM:SS
    pub clock: String,
    pub work_minutes: u64,
    pub break_minutes: u64,
    pub blocking: bool,
    pub groups: BTreeMap<SiteGroup, bool>,
    pub custom_sites: Vec<String>,
    pub blocked_sites: Vec<String>,
    pub always_on_top: bool,
}

impl SessionStatus {
    pub fn collect(state: &AppState) -> Result<Self, String> {
        let timer = state.timer.snapshot();
        let durations = state.get_durations()?;
        let selection = state.get_selection()?;
        let remaining = timer.display_remaining();

        Ok(Self {
            mode: timer.mode(),
            label: timer.mode().label().to_string(),
            remaining_seconds: remaining.as_secs(),
            clock: format_clock(remaining),
            work_minutes: durations.work_minutes(),
            break_minutes: durations.break_minutes(),
            blocking: state.blocking.load(Ordering::SeqCst),
            groups: selection.groups().clone(),
            custom_sites: selection.custom_sites().to_vec(),
            blocked_sites: selection.sites(),
            always_on_top: state.always_on_top.load(Ordering::SeqCst),
        })
    }
}

/// API response structure for session changing endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub session: SessionStatus,
}

impl ApiResponse {
    pub fn new(status: &str, message: String, session: SessionStatus) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            session,
        }
    }

    /// The request changed the session
    pub fn changed(message: String, session: SessionStatus) -> Self {
        Self::new("changed", message, session)
    }

    /// The request was valid but had nothing to do in the current state
    pub fn unchanged(message: String, session: SessionStatus) -> Self {
        Self::new("unchanged", message, session)
    }

    pub fn error(message: String, session: SessionStatus) -> Self {
        Self::new("error", message, session)
    }
}

/// Full status with diagnostics and server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session: SessionStatus,
    pub errors: Vec<String>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub hosts_file: String,
    pub window_found: bool,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of `PUT /durations`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DurationsRequest {
    pub work_minutes: Option<u64>,
    pub break_minutes: Option<u64>,
}

/// Body of `POST /sites`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRequest {
    pub site: String,
}

/// Body of `POST /window/always-on-top`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlwaysOnTopRequest {
    pub enabled: bool,
}
