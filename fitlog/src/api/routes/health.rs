//! Health check routes.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};

use crate::api::models::{ComponentHealth, HealthResponse};
use crate::api::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness_check))
}

fn cache_component(state: &AppState) -> ComponentHealth {
    let stats = state.exercise_cache.stats();
    ComponentHealth {
        name: "exercise_cache".to_string(),
        status: "healthy".to_string(),
        message: Some(format!(
            "{} entries, ttl {}s",
            stats.entry_count,
            stats.ttl.as_secs()
        )),
    }
}

fn upstream_component(state: &AppState) -> Option<ComponentHealth> {
    let snapshot = state.authenticator.as_ref()?.snapshot();
    let (status, message) = if snapshot.has_access_token {
        ("healthy", None)
    } else if snapshot.authenticating {
        ("degraded", Some("authentication in progress".to_string()))
    } else {
        (
            "degraded",
            Some(format!(
                "no access token ({} failed refresh attempts)",
                snapshot.refresh_attempts
            )),
        )
    };

    Some(ComponentHealth {
        name: "wger_session".to_string(),
        status: status.to_string(),
        message,
    })
}

/// Health check endpoint.
///
/// A missing upstream session degrades the service rather than failing it:
/// cached names can still be served.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut components = vec![cache_component(&state)];
    components.extend(upstream_component(&state));

    let status = if components.iter().all(|c| c.status == "healthy") {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        components,
    })
}

/// Liveness check - is the service alive?
async fn liveness_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive",
            "uptime_secs": uptime
        })),
    )
}
