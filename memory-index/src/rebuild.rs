//! Embed every event that does not have an embedding yet.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use lifelog_embeddings::{EmbeddingProvider, MAX_BATCH_SIZE};

use crate::cache::VectorCache;
use crate::composer::compose_event_text;
use crate::error::Result;
use crate::store::EventStore;
use crate::types::EventId;

/// Outcome of a rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    /// Events that lacked an embedding when the rebuild started.
    pub total: usize,

    /// Events embedded and persisted by this run.
    pub embedded: usize,

    /// Events that had text but could not be embedded or persisted.
    pub errors: usize,
}

/// Compose, embed and persist in batches, then invalidate the cache.
pub struct RebuildPipeline<'a> {
    store: &'a dyn EventStore,
    provider: &'a dyn EmbeddingProvider,
    cache: &'a VectorCache,
    batch_size: usize,
}

impl<'a> RebuildPipeline<'a> {
    pub fn new(
        store: &'a dyn EventStore,
        provider: &'a dyn EmbeddingProvider,
        cache: &'a VectorCache,
    ) -> Self {
        Self {
            store,
            provider,
            cache,
            batch_size: MAX_BATCH_SIZE,
        }
    }

    /// Set the batch size, clamped to `1..=MAX_BATCH_SIZE`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Run the rebuild.
    ///
    /// A failing batch is counted in `errors` and the run moves on. Events
    /// whose composed text is empty are skipped without being counted.
    /// The provider is not checked up front: without a credential every
    /// batch fails, so callers should consult `is_configured` first.
    pub async fn run(&self) -> Result<RebuildReport> {
        let ids = self.store.get_unembedded_event_ids().await?;
        let mut report = RebuildReport {
            total: ids.len(),
            ..RebuildReport::default()
        };

        info!("Rebuilding embeddings for {} events", report.total);

        for (batch, chunk) in ids.chunks(self.batch_size).enumerate() {
            self.run_batch(batch, chunk, &mut report).await;
        }

        self.cache.invalidate().await;

        info!(
            "Rebuild finished: {} of {} embedded, {} errors",
            report.embedded, report.total, report.errors
        );
        Ok(report)
    }

    async fn run_batch(&self, batch: usize, ids: &[EventId], report: &mut RebuildReport) {
        let mut pending_ids: Vec<&str> = Vec::with_capacity(ids.len());
        let mut texts: Vec<String> = Vec::with_capacity(ids.len());

        for id in ids {
            match compose_event_text(self.store, id).await {
                Ok(text) if text.is_empty() => debug!("No text for event {id}, skipping"),
                Ok(text) => {
                    pending_ids.push(id.as_str());
                    texts.push(text);
                }
                Err(err) => {
                    warn!("Failed to compose text for event {id}: {err}");
                    report.errors += 1;
                }
            }
        }

        if texts.is_empty() {
            return;
        }

        let vectors = match self.provider.embed_batch(&texts).await {
            Ok(vectors) => vectors,
            Err(err) => {
                warn!("Embedding batch {batch} ({} events) failed: {err}", texts.len());
                report.errors += texts.len();
                return;
            }
        };

        let model = self.provider.model();
        for (id, vector) in pending_ids.into_iter().zip(vectors) {
            match self.store.upsert_embedding(id, &vector, model).await {
                Ok(()) => report.embedded += 1,
                Err(err) => {
                    warn!("Failed to store embedding for event {id}: {err}");
                    report.errors += 1;
                }
            }
        }

        debug!("Batch {batch} done: {} embedded so far", report.embedded);
    }
}
