//! HTTP surface: job trigger endpoints and the preference API.

pub mod auth;
pub mod jobs;
pub mod preferences;
pub mod state;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{middleware, Json, Router};
use serde_json::json;

use crate::domain::errors::DomainError;

pub use state::AppState;

/// Handler-level error carrying the HTTP status it maps to.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self { status: StatusCode::UNPROCESSABLE_ENTITY, message: message.into() }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = match &err {
            DomainError::UserNotFound(_) | DomainError::GoalNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the complete router. Everything except the health probe sits behind
/// bearer-token verification.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/jobs/reminders", post(jobs::run_reminders))
        .route("/jobs/patterns", post(jobs::run_pattern_sweep))
        .route("/jobs/effectiveness", post(jobs::run_effectiveness))
        .route(
            "/users/:user_id/reminder-preferences",
            get(preferences::list_preferences),
        )
        .route(
            "/users/:user_id/goals/:goal_id/reminder-preference",
            patch(preferences::update_preference),
        )
        .route(
            "/users/:user_id/goals/:goal_id/pattern/recalculate",
            post(preferences::recalculate_pattern),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer))
        .route("/health", get(health))
        .with_state(state)
}
