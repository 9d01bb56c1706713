//! Error types for the memory index.

use thiserror::Error;

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors that can occur in the memory index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Embedding provider or similarity error.
    #[error("embedding error: {0}")]
    Embedding(#[from] lifelog_embeddings::EmbeddingError),

    /// The event store failed or rejected a write.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config file parse error.
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
