//! Exercise-name routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use wger_client::ExerciseName;

use crate::api::error::{ApiError, ApiResult};
use crate::api::middleware::{ApiKeyAuth, ApiKeyAuthLayer};
use crate::api::models::{LanguageQuery, LookupRequest};
use crate::api::server::AppState;
use crate::error::Error;

pub fn router(api_key_auth: ApiKeyAuth) -> Router<AppState> {
    Router::new()
        .route("/", get(list_exercise_names).post(lookup_exercise_name))
        .route(
            "/cache",
            delete(clear_cache).route_layer(ApiKeyAuthLayer::new(api_key_auth)),
        )
}

/// `GET /api/exercise-names?language=<n>`
///
/// Always succeeds; an unreachable upstream yields an empty list.
async fn list_exercise_names(
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
) -> Json<Vec<ExerciseName>> {
    let language = query.resolve();
    Json(state.exercise_cache.get_exercise_names(language).await)
}

/// `POST /api/exercise-names?language=<n>` with `{"name": "..."}`.
async fn lookup_exercise_name(
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
    Json(request): Json<LookupRequest>,
) -> ApiResult<Json<ExerciseName>> {
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::validation("Exercise name is required"))?;

    state
        .exercise_cache
        .find_by_name(query.resolve(), name)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Exercise '{name}' not found")))
}

/// `DELETE /api/exercise-names/cache`
async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.exercise_cache.invalidate_all();
    StatusCode::NO_CONTENT
}
