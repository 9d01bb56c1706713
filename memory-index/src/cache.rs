//! In-memory vector cache.
//!
//! The cache is either empty or holds every persisted embedding. The
//! first [`VectorCache::get`] after construction or invalidation reads the
//! full set from the store in one pass; it is never partially loaded.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use lifelog_embeddings::{Embedding, EmbeddingError};

use crate::error::Result;
use crate::store::EventStore;
use crate::types::EventId;

/// Event id to vector, in load/insertion order.
pub type VectorMap = IndexMap<EventId, Embedding>;

#[derive(Debug, Default)]
enum CacheState {
    #[default]
    Empty,
    Loaded(Arc<VectorMap>),
}

/// Process-lifetime cache of event vectors.
///
/// Readers get an `Arc` snapshot of the map; writers replace or
/// copy-on-write it, so a snapshot handed out never changes underneath
/// its holder.
#[derive(Debug)]
pub struct VectorCache {
    state: RwLock<CacheState>,

    /// Required length of every cached vector.
    dimension: usize,
}

impl VectorCache {
    /// Create an empty cache for vectors of `dimension` floats.
    pub fn new(dimension: usize) -> Self {
        Self {
            state: RwLock::new(CacheState::Empty),
            dimension,
        }
    }

    /// The current mapping, loading it from `store` first if needed.
    pub async fn get(&self, store: &dyn EventStore) -> Result<Arc<VectorMap>> {
        if let CacheState::Loaded(map) = &*self.state.read().await {
            return Ok(Arc::clone(map));
        }

        let mut state = self.state.write().await;
        // Another caller may have loaded while we waited for the lock.
        if let CacheState::Loaded(map) = &*state {
            return Ok(Arc::clone(map));
        }

        let rows = store.get_all_embeddings().await?;
        let mut map = VectorMap::with_capacity(rows.len());
        for row in rows {
            if row.vector.len() != self.dimension {
                warn!(
                    "Skipping embedding for {}: expected {} dimensions, got {}",
                    row.event_id,
                    self.dimension,
                    row.vector.len()
                );
                continue;
            }
            map.insert(row.event_id, row.vector);
        }

        info!("Loaded {} vectors into cache", map.len());
        let map = Arc::new(map);
        *state = CacheState::Loaded(Arc::clone(&map));
        Ok(map)
    }

    /// Insert or overwrite one entry without reloading.
    ///
    /// Does nothing while the cache is empty: the next [`get`](Self::get)
    /// reads the persisted vector along with everything else.
    pub async fn put(&self, event_id: impl Into<EventId>, vector: Embedding) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            }
            .into());
        }

        let mut state = self.state.write().await;
        if let CacheState::Loaded(map) = &mut *state {
            let event_id = event_id.into();
            debug!("Caching vector for {event_id}");
            Arc::make_mut(map).insert(event_id, vector);
        }
        Ok(())
    }

    /// Drop every entry; the next [`get`](Self::get) reloads from the store.
    pub async fn invalidate(&self) {
        *self.state.write().await = CacheState::Empty;
        info!("Invalidated vector cache");
    }

    /// Whether the cache currently holds the persisted set.
    pub async fn is_loaded(&self) -> bool {
        matches!(*self.state.read().await, CacheState::Loaded(_))
    }

    /// Number of cached vectors; zero while empty.
    pub async fn len(&self) -> usize {
        match &*self.state.read().await {
            CacheState::Loaded(map) => map.len(),
            CacheState::Empty => 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
