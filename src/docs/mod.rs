use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Connection, room and host statistics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Current diagnostics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Latest persisted content of a note
#[utoipa::path(
    get,
    path = "/api/v1/notes/{note_id}",
    params(
        ("note_id" = String, Path, description = "Note identifier")
    ),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn note_get_doc() {}

/// Persist the latest content of a note
#[utoipa::path(
    put,
    path = "/api/v1/notes/{note_id}",
    params(
        ("note_id" = String, Path, description = "Note identifier")
    ),
    request_body = NoteSaveRequest,
    responses(
        (status = 200, description = "Note saved", body = NoteSaveResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn note_save_doc() {}

/// Participants currently in the room of a note
#[utoipa::path(
    get,
    path = "/api/v1/notes/{note_id}/participants",
    params(
        ("note_id" = String, Path, description = "Note identifier")
    ),
    responses(
        (status = 200, description = "Room members", body = ParticipantsResponse)
    )
)]
#[allow(dead_code)]
pub async fn note_participants_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        note_get_doc,
        note_save_doc,
        note_participants_doc,
    ),
    components(
        schemas(
            HealthResponse,
            DiagnosticsResponse,
            NoteResponse,
            NoteSaveRequest,
            NoteSaveResponse,
            ParticipantsResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "notes", description = "Note persistence and room endpoints")
    )
)]
pub struct ApiDoc;
