//! API route modules.

pub mod exercise_names;
pub mod health;

use axum::Router;

use crate::api::server::AppState;

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/exercise-names",
            exercise_names::router(state.api_key_auth.clone()),
        )
        .nest("/health", health::router())
        .with_state(state)
}
