//! The semantic index facade used by chat, search and rebuild callers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use lifelog_embeddings::{EmbeddingError, EmbeddingProvider, MAX_BATCH_SIZE};

use crate::cache::VectorCache;
use crate::composer::compose_event_text;
use crate::config::IndexConfig;
use crate::error::Result;
use crate::rebuild::{RebuildPipeline, RebuildReport};
use crate::search::{SearchHit, rank};
use crate::store::EventStore;

/// Semantic memory index over an [`EventStore`].
///
/// Owns the vector cache; callers share one instance (typically behind an
/// `Arc`) instead of reaching for global state.
///
/// A rebuild that started before a single-event embed may invalidate the
/// cache after that embed's [`VectorCache::put`]. The entry then reappears
/// on the next reload from the store, so the window only costs a reload.
pub struct SemanticIndex {
    store: Arc<dyn EventStore>,
    provider: Arc<dyn EmbeddingProvider>,
    cache: VectorCache,
    rebuild_batch_size: usize,
    default_limit: usize,
}

impl SemanticIndex {
    /// Create an index over `store` using `provider` for vectors.
    pub fn new(store: Arc<dyn EventStore>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let cache = VectorCache::new(provider.dimension());
        Self {
            store,
            provider,
            cache,
            rebuild_batch_size: MAX_BATCH_SIZE,
            default_limit: 10,
        }
    }

    /// Create an index whose provider is built from `config`.
    pub fn from_config(config: &IndexConfig, store: Arc<dyn EventStore>) -> Result<Self> {
        config.validate()?;
        let provider = config.provider.build_provider()?;

        info!(
            "Semantic index using {} model {} ({} dimensions, configured: {})",
            provider.name(),
            config.provider.model,
            config.provider.dimension,
            provider.is_configured()
        );

        Ok(Self::new(store, Arc::new(provider))
            .with_rebuild_batch_size(config.rebuild.batch_size)
            .with_default_limit(config.search.default_limit))
    }

    /// Set the rebuild batch size, clamped to `1..=MAX_BATCH_SIZE`.
    pub fn with_rebuild_batch_size(mut self, batch_size: usize) -> Self {
        self.rebuild_batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Set the result count used by [`search_default`](Self::search_default).
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Whether the provider has a credential.
    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Rank cached events against `query`, best first, at most `limit`.
    pub async fn search(&self, query: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let vectors = self.cache.get(self.store.as_ref()).await?;
        if vectors.is_empty() {
            return Ok(Vec::new());
        }

        if query.len() != self.cache.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.cache.dimension(),
                actual: query.len(),
            }
            .into());
        }

        let hits = rank(&vectors, query, limit)?;
        debug!("Search over {} vectors returned {} hits", vectors.len(), hits.len());
        Ok(hits)
    }

    /// [`search`](Self::search) with the configured default limit.
    pub async fn search_default(&self, query: &[f32]) -> Result<Vec<SearchHit>> {
        self.search(query, self.default_limit).await
    }

    /// Embed `query` and search with the resulting vector.
    pub async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let vector = self.provider.embed_one(query).await?;
        self.search(&vector, limit).await
    }

    /// Embed every event missing an embedding. See [`RebuildPipeline::run`].
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        RebuildPipeline::new(self.store.as_ref(), self.provider.as_ref(), &self.cache)
            .with_batch_size(self.rebuild_batch_size)
            .run()
            .await
    }

    /// Embed one event if a provider credential is configured.
    ///
    /// Never fails: the caller's own operation (recording the event) must
    /// not depend on embedding succeeding. Failures are logged.
    pub async fn embed_if_configured(&self, event_id: &str) {
        if !self.is_configured() {
            debug!("Embedding provider not configured, skipping event {event_id}");
            return;
        }

        match self.embed_event(event_id).await {
            Ok(true) => debug!("Embedded event {event_id}"),
            Ok(false) => debug!("No text for event {event_id}, nothing to embed"),
            Err(err) => warn!("Failed to embed event {event_id}: {err}"),
        }
    }

    async fn embed_event(&self, event_id: &str) -> Result<bool> {
        let text = compose_event_text(self.store.as_ref(), event_id).await?;
        if text.is_empty() {
            return Ok(false);
        }

        let vector = self.provider.embed_one(&text).await?;
        self.store
            .upsert_embedding(event_id, &vector, self.provider.model())
            .await?;
        self.cache.put(event_id, vector).await?;
        Ok(true)
    }

    /// Drop the cache; the next search reloads from the store.
    pub async fn invalidate_cache(&self) {
        self.cache.invalidate().await;
    }

    /// Text that would be embedded for `event_id`.
    pub async fn compose(&self, event_id: &str) -> Result<String> {
        compose_event_text(self.store.as_ref(), event_id).await
    }

    /// Current cache and provider status.
    pub async fn stats(&self) -> IndexStats {
        IndexStats {
            cached_vectors: self.cache.len().await,
            cache_loaded: self.cache.is_loaded().await,
            configured: self.is_configured(),
            model: self.provider.model().to_string(),
        }
    }
}

/// Statistics about the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of vectors in the cache.
    pub cached_vectors: usize,

    /// Whether the cache has been loaded since the last invalidation.
    pub cache_loaded: bool,

    /// Whether the provider has a credential.
    pub configured: bool,

    /// Model used for new embeddings.
    pub model: String,
}
