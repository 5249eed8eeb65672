use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Error as SqlxError;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),
}

pub type StoreResult<'a, T> = BoxFuture<'a, Result<T, StoreError>>;

/// Note row as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteRow {
    pub note_id: String,
    pub content: String,
    pub last_edited: DateTime<Utc>,
}

/// Durable store behind the persistence bridge.
pub trait NoteStore: Send + Sync {
    /// Write the latest content of a note, creating the note if it does not exist yet.
    ///
    /// A write stamped older than the stored note is ignored; either way the
    /// stored note is returned.
    fn save_content<'a>(&'a self, note_id: &'a str, content: &'a str, edited_at: DateTime<Utc>) -> StoreResult<'a, NoteRow>;

    fn load<'a>(&'a self, note_id: &'a str) -> StoreResult<'a, Option<NoteRow>>;
}

/// Postgres backed note store
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    /// Connect to the database and make sure the notes table exists
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    pub async fn connect(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), SqlxError> {
        let create_sql = r#"
            CREATE TABLE IF NOT EXISTS notes (
                note_id TEXT PRIMARY KEY,
                content TEXT NOT NULL DEFAULT '',
                last_edited TIMESTAMPTZ NOT NULL DEFAULT now()
            )
        "#;
        if let Err(e) = sqlx::query(create_sql).execute(&self.pool).await {
            error!("Failed to create notes table: {}", e);
            return Err(e);
        }
        Ok(())
    }
}

impl NoteStore for PgNoteStore {
    fn save_content<'a>(&'a self, note_id: &'a str, content: &'a str, edited_at: DateTime<Utc>) -> StoreResult<'a, NoteRow> {
        Box::pin(async move {
            // Last write wins by edit time: an older stamp never replaces a newer one.
            let upsert_sql = r#"
                INSERT INTO notes (note_id, content, last_edited)
                VALUES ($1, $2, $3)
                ON CONFLICT (note_id)
                DO UPDATE SET content = EXCLUDED.content, last_edited = EXCLUDED.last_edited
                WHERE notes.last_edited <= EXCLUDED.last_edited
                RETURNING note_id, content, last_edited
            "#;

            let saved = sqlx::query_as::<_, NoteRow>(upsert_sql)
                .bind(note_id)
                .bind(content)
                .bind(edited_at)
                .fetch_optional(&self.pool)
                .await?;
            if let Some(note) = saved {
                return Ok::<_, StoreError>(note);
            }

            let current = sqlx::query_as::<_, NoteRow>(
                "SELECT note_id, content, last_edited FROM notes WHERE note_id = $1",
            )
            .bind(note_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(current)
        })
    }

    fn load<'a>(&'a self, note_id: &'a str) -> StoreResult<'a, Option<NoteRow>> {
        Box::pin(async move {
            let note = sqlx::query_as::<_, NoteRow>(
                "SELECT note_id, content, last_edited FROM notes WHERE note_id = $1",
            )
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, StoreError>(note)
        })
    }
}

/// Note store kept in process memory, used when no database is configured.
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: RwLock<HashMap<String, NoteRow>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NoteStore for MemoryNoteStore {
    fn save_content<'a>(&'a self, note_id: &'a str, content: &'a str, edited_at: DateTime<Utc>) -> StoreResult<'a, NoteRow> {
        Box::pin(async move {
            let mut notes = self.notes.write().await;
            let note = notes
                .entry(note_id.to_string())
                .and_modify(|note| {
                    if note.last_edited <= edited_at {
                        note.content = content.to_string();
                        note.last_edited = edited_at;
                    }
                })
                .or_insert_with(|| NoteRow {
                    note_id: note_id.to_string(),
                    content: content.to_string(),
                    last_edited: edited_at,
                });
            Ok::<_, StoreError>(note.clone())
        })
    }

    fn load<'a>(&'a self, note_id: &'a str) -> StoreResult<'a, Option<NoteRow>> {
        Box::pin(async move { Ok::<_, StoreError>(self.notes.read().await.get(note_id).cloned()) })
    }
}
