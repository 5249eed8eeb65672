use crate::{
    AppState,
    handlers::{diagnostics, health_check, note_get, note_participants, note_save, ready_check},
};
use axum::{routing::get, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes() -> Router<Arc<AppState>> {
    Router::<Arc<AppState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/notes/:note_id", get(note_get).put(note_save))
        .route("/v1/notes/:note_id/participants", get(note_participants))
}
