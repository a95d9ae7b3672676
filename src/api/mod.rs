//! HTTP API module
//!
//! This module contains the local control endpoints and their response
//! structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/start", post(start_handler))
        .route("/pause", post(pause_handler))
        .route("/resume", post(resume_handler))
        .route("/acknowledge", post(acknowledge_handler))
        .route("/reset", post(reset_handler))
        .route("/durations", put(set_durations_handler))
        .route("/durations/:kind/:direction", post(adjust_duration_handler))
        .route("/groups/:name/toggle", post(toggle_group_handler))
        .route("/sites", post(add_site_handler))
        .route("/sites/:site", delete(remove_site_handler))
        .route("/window/always-on-top", post(always_on_top_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::responses::{ApiResponse, StatusResponse},
        config::DurationSettings,
        services::HostLedger,
        state::{BlockSelection, Mode, SessionTimer},
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde::de::DeserializeOwned;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let durations = DurationSettings::default();
        let (timer, _streams) = SessionTimer::new(durations.work(), durations.break_duration());
        Arc::new(AppState::new(
            timer,
            HostLedger::new("/nonexistent/hosts", "nuisance"),
            durations,
            BlockSelection::new(),
        ))
    }

    async fn send<T: DeserializeOwned>(
        state: &Arc<AppState>,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Option<T>) {
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header("content-type", "application/json");
        }
        let request = request
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = create_router(Arc::clone(state)).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).ok())
    }

    #[tokio::test]
    async fn test_start_and_pause() {
        let state = test_state();

        let (status, body) = send::<ApiResponse>(&state, "POST", "/start", None).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body.status, "changed");
        assert_eq!(body.session.mode, Mode::Work);
        assert_eq!(body.session.clock, "25:00");

        let (_, body) = send::<ApiResponse>(&state, "POST", "/pause", None).await;
        assert_eq!(body.unwrap().session.mode, Mode::Paused);

        state.reset();
    }

    #[tokio::test]
    async fn test_invalid_transition_returns_unchanged() {
        let state = test_state();

        let (status, body) = send::<ApiResponse>(&state, "POST", "/pause", None).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body.status, "unchanged");
        assert_eq!(body.session.mode, Mode::Idle);
    }

    #[tokio::test]
    async fn test_duration_endpoints() {
        let state = test_state();

        let (status, body) =
            send::<ApiResponse>(&state, "POST", "/durations/work/decrease", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap().session.work_minutes, 20);
        assert_eq!(state.timer.snapshot().work_duration(), Duration::from_secs(20 * 60));

        let (_, body) = send::<ApiResponse>(
            &state,
            "PUT",
            "/durations",
            Some(r#"{"break_minutes": 30}"#),
        )
        .await;
        assert_eq!(body.unwrap().session.break_minutes, 30);

        let (_, body) = send::<ApiResponse>(&state, "POST", "/durations/break/increase", None).await;
        assert_eq!(body.unwrap().status, "unchanged");

        let (status, _) = send::<ApiResponse>(&state, "POST", "/durations/lunch/increase", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_site_endpoints() {
        let state = test_state();

        let (status, body) = send::<ApiResponse>(&state, "POST", "/groups/reddit/toggle", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.unwrap().session.blocked_sites.contains(&"reddit.com".to_string()));

        let (status, _) = send::<ApiResponse>(&state, "POST", "/groups/myspace/toggle", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send::<ApiResponse>(&state, "POST", "/sites", Some(r#"{"site": "Hacker News"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send::<ApiResponse>(&state, "POST", "/sites", Some(r#"{"site": "news"}"#)).await;
        assert_eq!(body.unwrap().session.custom_sites, vec!["news.com".to_string()]);

        let (status, _) =
            send::<ApiResponse>(&state, "POST", "/sites", Some(r#"{"site": "www.example.com"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send::<ApiResponse>(&state, "DELETE", "/sites/news.com", None).await;
        let body = body.unwrap();
        assert_eq!(body.status, "changed");
        assert!(body.session.custom_sites.is_empty());
    }

    #[tokio::test]
    async fn test_always_on_top_without_window_reports_error() {
        let state = test_state();

        let (status, body) = send::<ApiResponse>(
            &state,
            "POST",
            "/window/always-on-top",
            Some(r#"{"enabled": false}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap().status, "error");
        assert_eq!(state.get_diagnostics().unwrap().errors.len(), 1);
    }

    #[tokio::test]
    async fn test_status_and_health() {
        let state = test_state();

        let (status, body) = send::<StatusResponse>(&state, "GET", "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body.session.mode, Mode::Idle);
        assert_eq!(body.session.label, "Ready");
        assert_eq!(body.session.blocked_sites.len(), 17);
        assert_eq!(body.hosts_file, "/nonexistent/hosts");
        assert!(!body.window_found);

        let (status, _) = send::<serde_json::Value>(&state, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
