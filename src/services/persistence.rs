use chrono::Utc;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::db::notes::{NoteRow, NoteStore, StoreError};

/// Write path from editing clients to the durable note store.
///
/// Runs independently of the realtime relay: a failed save is reported to the
/// caller and logged, never retried, and the next save supersedes it.
///
/// The cache only ever moves forward in `last_edited`, so a save or load that
/// completes late cannot shadow newer content already cached.
pub struct PersistenceBridge {
    store: Arc<dyn NoteStore>,
    cache: Cache<String, NoteRow>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn NoteStore>, cache_capacity: u64, cache_idle: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(cache_capacity)
            .time_to_idle(cache_idle)
            .build();
        Self { store, cache }
    }

    /// Persist the latest content of a note.
    ///
    /// Returns the note as the store now holds it, which is a concurrent
    /// newer edit if this one lost the race.
    pub async fn save_content(&self, note_id: &str, content: &str) -> Result<NoteRow, StoreError> {
        match self.store.save_content(note_id, content, Utc::now()).await {
            Ok(note) => {
                info!("Note {} saved ({} bytes)", note_id, note.content.len());
                self.cache_if_newer(note_id, note.clone()).await;
                Ok(note)
            }
            Err(e) => {
                error!("Failed to save note {}: {}", note_id, e);
                Err(e)
            }
        }
    }

    /// Latest persisted state of a note, from cache when possible.
    pub async fn load(&self, note_id: &str) -> Result<Option<NoteRow>, StoreError> {
        if let Some(note) = self.cache.get(note_id).await {
            debug!("Note {} served from cache", note_id);
            return Ok(Some(note));
        }

        let note = self.store.load(note_id).await.map_err(|e| {
            error!("Failed to load note {}: {}", note_id, e);
            e
        })?;
        if let Some(note) = &note {
            self.cache_if_newer(note_id, note.clone()).await;
        }
        Ok(note)
    }

    async fn cache_if_newer(&self, note_id: &str, note: NoteRow) {
        let incoming = note.last_edited;
        let result = self
            .cache
            .entry(note_id.to_string())
            .and_compute_with(|cached| async move {
                match cached {
                    Some(entry) if entry.value().last_edited >= incoming => Op::Nop,
                    _ => Op::Put(note),
                }
            })
            .await;
        if matches!(result, CompResult::Unchanged(_)) {
            debug!("Cached note {} is at least as new as {}", note_id, incoming);
        }
    }

    pub fn cached_notes(&self) -> u64 {
        self.cache.entry_count()
    }
}
