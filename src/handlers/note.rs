use crate::{
    AppState,
    models::{ErrorResponse, NoteResponse, NoteSaveRequest, NoteSaveResponse, ParticipantsResponse},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

/// Get the latest persisted content of a note
pub async fn note_get(
    State(app_state): State<Arc<AppState>>,
    Path(note_id): Path<String>,
) -> Result<(StatusCode, Json<NoteResponse>), (StatusCode, Json<ErrorResponse>)> {
    match app_state.persistence.load(&note_id).await {
        Ok(Some(note)) => Ok((StatusCode::OK, Json(note.into()))),
        Ok(None) => {
            debug!("Note '{}' not found", note_id);
            Err(ErrorResponse::reply(
                StatusCode::NOT_FOUND,
                format!("Note '{}' not found", note_id),
            ))
        }
        Err(e) => Err(ErrorResponse::reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to load note '{}': {}", note_id, e),
        )),
    }
}

/// Persist the latest content of a note.
///
/// Clients call this next to the websocket `editNote` event; the two paths are
/// not coordinated and the last successful save wins.
pub async fn note_save(
    State(app_state): State<Arc<AppState>>,
    Path(note_id): Path<String>,
    Json(request): Json<NoteSaveRequest>,
) -> Result<(StatusCode, Json<NoteSaveResponse>), (StatusCode, Json<ErrorResponse>)> {
    match app_state.persistence.save_content(&note_id, &request.content).await {
        Ok(note) => Ok((
            StatusCode::OK,
            Json(NoteSaveResponse {
                content: note.content,
                last_edited: note.last_edited,
            }),
        )),
        Err(e) => {
            error!("Save of note '{}' failed: {}", note_id, e);
            Err(ErrorResponse::reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to save note '{}': {}", note_id, e),
            ))
        }
    }
}

/// List the participants currently in the room of a note
pub async fn note_participants(
    State(app_state): State<Arc<AppState>>,
    Path(note_id): Path<String>,
) -> (StatusCode, Json<ParticipantsResponse>) {
    let participants = app_state.gateway.members_of(&note_id).await;
    (
        StatusCode::OK,
        Json(ParticipantsResponse { note_id, participants }),
    )
}
