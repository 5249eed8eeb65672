use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::notes::NoteRow;

/// Latest persisted state of a note
#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub note_id: String,
    pub content: String,
    pub last_edited: DateTime<Utc>,
}

impl From<NoteRow> for NoteResponse {
    fn from(row: NoteRow) -> Self {
        Self {
            note_id: row.note_id,
            content: row.content,
            last_edited: row.last_edited,
        }
    }
}

/// Request to persist the content of a note
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct NoteSaveRequest {
    pub content: String,
}

/// Response after persisting the content of a note
#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NoteSaveResponse {
    pub content: String,
    pub last_edited: DateTime<Utc>,
}

/// Participants currently in the room of a note
#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsResponse {
    pub note_id: String,
    pub participants: Vec<String>,
}
