//! Event store interface and an in-process implementation.
//!
//! The index only reads events and domain records; the sole writes it
//! issues are embedding upserts. [`MemoryStore`] keeps everything in maps
//! and can persist a JSON snapshot, written via temp file + rename.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{IndexError, Result};
use crate::types::{
    CalendarItem, DomainRecord, Event, EventId, HealthEntry, Mood, Note, Photo, Place,
    StoredEmbedding, Video, VoiceMemo,
};

/// Persistent storage consumed by the index.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Every persisted embedding.
    async fn get_all_embeddings(&self) -> Result<Vec<StoredEmbedding>>;

    /// Insert or overwrite the embedding of one event. Atomic per event.
    async fn upsert_embedding(&self, event_id: &str, vector: &[f32], model: &str) -> Result<()>;

    /// Ids of events that have no embedding yet.
    async fn get_unembedded_event_ids(&self) -> Result<Vec<EventId>>;

    async fn get_event(&self, id: &str) -> Result<Option<Event>>;

    async fn note_by_event(&self, event_id: &str) -> Result<Option<Note>>;

    async fn voice_memo_by_event(&self, event_id: &str) -> Result<Option<VoiceMemo>>;

    async fn calendar_event_by_event(&self, event_id: &str) -> Result<Option<CalendarItem>>;

    async fn location_by_event(&self, event_id: &str) -> Result<Option<Place>>;

    async fn mood_by_event(&self, event_id: &str) -> Result<Option<Mood>>;

    async fn health_entry_by_event(&self, event_id: &str) -> Result<Option<HealthEntry>>;

    /// The photo linked to an event, including its analysis if any.
    async fn photo_by_event(&self, event_id: &str) -> Result<Option<Photo>>;

    async fn video_by_event(&self, event_id: &str) -> Result<Option<Video>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    events: IndexMap<EventId, Event>,
    records: HashMap<EventId, DomainRecord>,
    embeddings: IndexMap<EventId, StoredEmbedding>,
}

/// In-process [`EventStore`].
pub struct MemoryStore {
    data: RwLock<Snapshot>,

    /// Where [`MemoryStore::save`] writes the snapshot.
    path: Option<PathBuf>,
}

impl MemoryStore {
    /// Create an empty store with no backing file.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Snapshot::default()),
            path: None,
        }
    }

    /// Open a store backed by a JSON snapshot, loading it if it exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let snapshot = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            let snapshot: Snapshot = serde_json::from_str(&content)?;
            info!(
                "Loaded {} events and {} embeddings from {}",
                snapshot.events.len(),
                snapshot.embeddings.len(),
                path.display()
            );
            snapshot
        } else {
            Snapshot::default()
        };

        Ok(Self {
            data: RwLock::new(snapshot),
            path: Some(path),
        })
    }

    /// Write the snapshot to the backing file, if there is one.
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = {
            let data = self.data.read().await;
            serde_json::to_string_pretty(&*data)?
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, path).await?;

        debug!("Saved store snapshot to {}", path.display());
        Ok(())
    }

    /// Add an event. Events are immutable, so an existing id is rejected.
    pub async fn insert_event(&self, event: Event) -> Result<()> {
        let mut data = self.data.write().await;
        if data.events.contains_key(&event.id) {
            return Err(IndexError::Store(format!("event already exists: {}", event.id)));
        }
        data.events.insert(event.id.clone(), event);
        Ok(())
    }

    /// Link a domain record to an event of the matching kind.
    pub async fn attach(&self, event_id: &str, record: DomainRecord) -> Result<()> {
        let mut data = self.data.write().await;
        let event = data
            .events
            .get(event_id)
            .ok_or_else(|| IndexError::Store(format!("event not found: {event_id}")))?;

        if event.kind != record.kind() {
            return Err(IndexError::Store(format!(
                "cannot attach {:?} record to {:?} event {event_id}",
                record.kind(),
                event.kind
            )));
        }

        data.records.insert(event_id.to_string(), record);
        Ok(())
    }

    async fn record(&self, event_id: &str) -> Option<DomainRecord> {
        self.data.read().await.records.get(event_id).cloned()
    }

    /// Number of persisted embeddings.
    pub async fn embedding_count(&self) -> usize {
        self.data.read().await.embeddings.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn get_all_embeddings(&self) -> Result<Vec<StoredEmbedding>> {
        Ok(self.data.read().await.embeddings.values().cloned().collect())
    }

    async fn upsert_embedding(&self, event_id: &str, vector: &[f32], model: &str) -> Result<()> {
        let mut data = self.data.write().await;
        if !data.events.contains_key(event_id) {
            return Err(IndexError::Store(format!("event not found: {event_id}")));
        }

        data.embeddings.insert(
            event_id.to_string(),
            StoredEmbedding {
                event_id: event_id.to_string(),
                vector: vector.to_vec(),
                model: model.to_string(),
            },
        );
        Ok(())
    }

    async fn get_unembedded_event_ids(&self) -> Result<Vec<EventId>> {
        let data = self.data.read().await;
        Ok(data
            .events
            .keys()
            .filter(|id| !data.embeddings.contains_key(*id))
            .cloned()
            .collect())
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>> {
        Ok(self.data.read().await.events.get(id).cloned())
    }

    async fn note_by_event(&self, event_id: &str) -> Result<Option<Note>> {
        Ok(match self.record(event_id).await {
            Some(DomainRecord::Note(record)) => Some(record),
            _ => None,
        })
    }

    async fn voice_memo_by_event(&self, event_id: &str) -> Result<Option<VoiceMemo>> {
        Ok(match self.record(event_id).await {
            Some(DomainRecord::VoiceMemo(record)) => Some(record),
            _ => None,
        })
    }

    async fn calendar_event_by_event(&self, event_id: &str) -> Result<Option<CalendarItem>> {
        Ok(match self.record(event_id).await {
            Some(DomainRecord::Calendar(record)) => Some(record),
            _ => None,
        })
    }

    async fn location_by_event(&self, event_id: &str) -> Result<Option<Place>> {
        Ok(match self.record(event_id).await {
            Some(DomainRecord::Location(record)) => Some(record),
            _ => None,
        })
    }

    async fn mood_by_event(&self, event_id: &str) -> Result<Option<Mood>> {
        Ok(match self.record(event_id).await {
            Some(DomainRecord::Mood(record)) => Some(record),
            _ => None,
        })
    }

    async fn health_entry_by_event(&self, event_id: &str) -> Result<Option<HealthEntry>> {
        Ok(match self.record(event_id).await {
            Some(DomainRecord::Health(record)) => Some(record),
            _ => None,
        })
    }

    async fn photo_by_event(&self, event_id: &str) -> Result<Option<Photo>> {
        Ok(match self.record(event_id).await {
            Some(DomainRecord::Photo(record)) => Some(record),
            _ => None,
        })
    }

    async fn video_by_event(&self, event_id: &str) -> Result<Option<Video>> {
        Ok(match self.record(event_id).await {
            Some(DomainRecord::Video(record)) => Some(record),
            _ => None,
        })
    }
}
