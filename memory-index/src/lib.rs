//! # Memory Index
//!
//! Semantic search over life-events (transactions, notes, voice memos,
//! calendar items, places, moods, health readings, photos, videos).
//!
//! - **Composer**: one canonical text per event, built from its summary
//!   and linked domain records
//! - **Vector Cache**: every persisted embedding, loaded lazily and
//!   invalidated wholesale
//! - **Search**: cosine ranking of the cache against a query vector
//! - **Rebuild**: batched embedding of every event that has none
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Semantic Index                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  rebuild ──► composer ──► EmbeddingProvider ──► EventStore      │
//! │                                                     │           │
//! │                                                     ▼           │
//! │  search  ──────────────────────► VectorCache ◄── (reload)       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lifelog_memory_index::{IndexConfig, MemoryStore, SemanticIndex};
//!
//! let config = IndexConfig::load("lifelog.toml").await?.with_env_overrides();
//! let store = Arc::new(MemoryStore::open(&config.store_path).await?);
//! let index = SemanticIndex::from_config(&config, store)?;
//!
//! if index.is_configured() {
//!     let report = index.rebuild().await?;
//!     println!("embedded {} of {}", report.embedded, report.total);
//! }
//! let hits = index.search_text("dinner with friends", 5).await?;
//! ```

pub mod cache;
pub mod composer;
pub mod config;
pub mod engine;
pub mod error;
pub mod rebuild;
pub mod search;
pub mod store;
pub mod types;

pub use cache::{VectorCache, VectorMap};
pub use composer::{MAX_TEXT_CHARS, compose_event_text};
pub use config::IndexConfig;
pub use engine::{IndexStats, SemanticIndex};
pub use error::{IndexError, Result};
pub use rebuild::{RebuildPipeline, RebuildReport};
pub use search::SearchHit;
pub use store::{EventStore, MemoryStore};
pub use types::{
    CalendarItem, DomainRecord, Event, EventId, EventKind, HealthEntry, Mood, Note, Parsed, Photo,
    PhotoAnalysis, Place, StoredEmbedding, Video, VoiceMemo,
};

// Re-export from dependencies for convenience
pub use lifelog_embeddings::{Embedding, EmbeddingProvider, OpenAIProvider};
