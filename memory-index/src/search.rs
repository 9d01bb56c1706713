//! Cosine ranking over the vector cache.

use serde::{Deserialize, Serialize};

use lifelog_embeddings::{SimilarityResult, find_top_k};

use crate::cache::VectorMap;
use crate::error::Result;
use crate::types::EventId;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub event_id: EventId,

    /// Cosine similarity in `[-1, 1]`; zero against a zero vector.
    pub score: f32,
}

impl From<SimilarityResult> for SearchHit {
    fn from(result: SimilarityResult) -> Self {
        Self {
            event_id: result.id,
            score: result.score,
        }
    }
}

/// Rank every cached vector against `query` and keep the best `limit`.
///
/// Equal scores keep cache iteration order, which follows the order the
/// store returned rows on the last load. That order is not guaranteed to
/// survive a restart, so ties have no stable ranking.
pub fn rank(vectors: &VectorMap, query: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
    if vectors.is_empty() {
        return Ok(Vec::new());
    }

    let candidates = vectors
        .iter()
        .map(|(event_id, vector)| (event_id.as_str(), vector.as_slice()));

    Ok(find_top_k(query, candidates, limit)?
        .into_iter()
        .map(SearchHit::from)
        .collect())
}
