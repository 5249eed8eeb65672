use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::debug;

use crate::AppState;
use crate::models::HealthResponse;

/// Health check endpoint
pub async fn health_check(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: format!("{} is running", app_state.config.service_name),
    })
}

/// Readiness check endpoint
///
/// Rooms live in memory and the note store degrades to memory when the
/// database is unavailable, so a running process is ready to accept joins.
pub async fn ready_check(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Readiness check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: format!("{} is ready", app_state.config.service_name),
    })
}
