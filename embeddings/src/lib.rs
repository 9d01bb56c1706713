//! # Embeddings
//!
//! This crate turns text into fixed-length vectors through a remote
//! embedding provider and ranks vectors by cosine similarity. It is the
//! event-agnostic half of the lifelog memory index.
//!
//! ## Features
//!
//! - **Provider Client**: single and batched embedding requests against an
//!   OpenAI-compatible `/embeddings` endpoint
//! - **Ordered Batching**: inputs are split into sub-batches of at most
//!   [`MAX_BATCH_SIZE`] and results are returned in submission order
//! - **Similarity Ranking**: cosine similarity and top-k selection
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings                                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  texts ──► EmbeddingProvider ──► sub-batches ──► re-sort by idx │
//! │                                                       │         │
//! │                                                       ▼         │
//! │  query ──► cosine_similarity ──► find_top_k ◄── Embedding       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod similarity;

pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, OpenAIProvider};
pub use similarity::{SimilarityResult, cosine_similarity, find_top_k};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of the vectors stored by the memory index.
pub const DEFAULT_DIMENSION: usize = 384;

/// Maximum number of characters submitted to the provider per input.
pub const MAX_INPUT_CHARS: usize = 8000;

/// Maximum number of inputs sent in a single provider call.
pub const MAX_BATCH_SIZE: usize = 100;

/// Truncate `text` to at most `max_chars` characters.
///
/// Counts `char`s rather than bytes so multi-byte text is never split
/// inside a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
