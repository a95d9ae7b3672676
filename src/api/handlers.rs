//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    services::SoundEvent,
    state::{normalize_hostname, AppState, DurationKind, ModeChange, SiteGroup},
};
use super::responses::{
    AlwaysOnTopRequest, ApiResponse, DurationsRequest, HealthResponse, SessionStatus, SiteRequest,
    StatusResponse,
};

type ApiResult = Result<Json<ApiResponse>, StatusCode>;

fn session_status(state: &AppState) -> Result<SessionStatus, StatusCode> {
    SessionStatus::collect(state).map_err(|e| {
        error!("Failed to collect session status: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Build the response for a timer command. A refused transition is not an
/// error, the client just gets the unchanged session back.
fn timer_response(state: &AppState, command: &str, change: Option<ModeChange>) -> ApiResult {
    let session = session_status(state)?;
    match change {
        Some(change) => {
            info!("{} endpoint called - {} -> {}", command, change.from.as_str(), change.to.as_str());
            Ok(Json(ApiResponse::changed(
                format!("Session moved from {} to {}", change.from.as_str(), change.to.as_str()),
                session,
            )))
        }
        None => Ok(Json(ApiResponse::unchanged(
            format!("{} has no effect while {}", command, session.mode.as_str()),
            session,
        ))),
    }
}

/// Handle POST /start - Start, resume or acknowledge depending on the mode
pub async fn start_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    state.sound.play(SoundEvent::Button);
    let change = state.press_start();
    timer_response(&state, "Start", change)
}

/// Handle POST /pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    state.sound.play(SoundEvent::Button);
    let change = state.pause();
    timer_response(&state, "Pause", change)
}

/// Handle POST /resume
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    state.sound.play(SoundEvent::Button);
    let change = state.resume();
    timer_response(&state, "Resume", change)
}

/// Handle POST /acknowledge - Silence an alarm and move on
pub async fn acknowledge_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let change = state.acknowledge();
    timer_response(&state, "Acknowledge", change)
}

/// Handle POST /reset - Back to idle from anywhere
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    state.sound.play(SoundEvent::Button);
    let change = state.reset();
    timer_response(&state, "Reset", change)
}

/// Handle PUT /durations
pub async fn set_durations_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DurationsRequest>,
) -> ApiResult {
    let durations = state
        .set_durations(request.work_minutes, request.break_minutes)
        .map_err(|e| {
            error!("Failed to set durations: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    info!(
        "Durations set to {}min work, {}min break",
        durations.work_minutes(),
        durations.break_minutes()
    );
    Ok(Json(ApiResponse::changed(
        format!("Durations set to {}/{} minutes", durations.work_minutes(), durations.break_minutes()),
        session_status(&state)?,
    )))
}

/// Handle POST /durations/:kind/:direction - Step a duration by five minutes
pub async fn adjust_duration_handler(
    State(state): State<Arc<AppState>>,
    Path((kind, direction)): Path<(String, String)>,
) -> ApiResult {
    let kind = match kind.as_str() {
        "work" => DurationKind::Work,
        "break" => DurationKind::Break,
        _ => return Err(StatusCode::NOT_FOUND),
    };
    let increase = match direction.as_str() {
        "increase" => true,
        "decrease" => false,
        _ => return Err(StatusCode::NOT_FOUND),
    };

    state.sound.play(SoundEvent::Button);
    let (durations, changed) = state.adjust_duration(kind, increase).map_err(|e| {
        error!("Failed to adjust duration: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let message = format!(
        "Durations are {}/{} minutes",
        durations.work_minutes(),
        durations.break_minutes()
    );
    let session = session_status(&state)?;
    if changed {
        Ok(Json(ApiResponse::changed(message, session)))
    } else {
        Ok(Json(ApiResponse::unchanged(message, session)))
    }
}

/// Handle POST /groups/:name/toggle
pub async fn toggle_group_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult {
    let group = SiteGroup::from_name(&name).ok_or_else(|| {
        warn!("Unknown site group: {}", name);
        StatusCode::NOT_FOUND
    })?;

    let enabled = state.toggle_group(group).map_err(|e| {
        error!("Failed to toggle site group: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(ApiResponse::changed(
        format!(
            "Site group {} {}",
            group.as_str(),
            if enabled { "enabled" } else { "disabled" }
        ),
        session_status(&state)?,
    )))
}

/// Handle POST /sites - Add a custom hostname
pub async fn add_site_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SiteRequest>,
) -> ApiResult {
    if normalize_hostname(&request.site).is_none() {
        warn!("Rejected site: {:?}", request.site);
        return Err(StatusCode::BAD_REQUEST);
    }

    let added = state.add_site(&request.site).map_err(|e| {
        error!("Failed to add site: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let session = session_status(&state)?;
    match added {
        Some(site) => Ok(Json(ApiResponse::changed(format!("Added {}", site), session))),
        None => Ok(Json(ApiResponse::unchanged(
            format!("{} is already listed", request.site.trim()),
            session,
        ))),
    }
}

/// Handle DELETE /sites/:site - Remove a custom hostname
pub async fn remove_site_handler(
    State(state): State<Arc<AppState>>,
    Path(site): Path<String>,
) -> ApiResult {
    let removed = state.remove_site(&site).map_err(|e| {
        error!("Failed to remove site: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let session = session_status(&state)?;
    if removed {
        info!("Custom site removed: {}", site);
        Ok(Json(ApiResponse::changed(format!("Removed {}", site), session)))
    } else {
        Ok(Json(ApiResponse::unchanged(format!("{} is not listed", site), session)))
    }
}

/// Handle POST /window/always-on-top
pub async fn always_on_top_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AlwaysOnTopRequest>,
) -> ApiResult {
    match state.set_always_on_top(request.enabled).await {
        Ok(()) => {
            if let Err(e) = state.clear_errors_for("window") {
                warn!("Failed to clear window errors: {}", e);
            }
            Ok(Json(ApiResponse::changed(
                format!("Always on top {}", if request.enabled { "enabled" } else { "disabled" }),
                session_status(&state)?,
            )))
        }
        Err(e) => {
            let error_msg = format!("Window pin failed: {}", e);
            warn!("{}", error_msg);
            if let Err(e) = state.add_error(error_msg.clone()) {
                error!("Failed to add error to state: {}", e);
            }
            Ok(Json(ApiResponse::error(error_msg, session_status(&state)?)))
        }
    }
}

/// Handle GET /status - Return the session with diagnostics
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let session = session_status(&state)?;
    let diagnostics = match state.get_diagnostics() {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to get diagnostics: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(Json(StatusResponse {
        session,
        errors: diagnostics.errors,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        hosts_file: state.ledger.path().display().to_string(),
        window_found: state.window_handle().is_some(),
        last_action: diagnostics.last_action,
        last_action_time: diagnostics.last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
