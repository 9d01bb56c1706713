//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// No provider credential is configured. Raised before any network call.
    #[error("embedding provider not configured")]
    ProviderNotConfigured,

    /// The provider answered with a non-success status.
    #[error("embedding provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl EmbeddingError {
    /// Whether this error comes from missing configuration rather than
    /// from the provider itself.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ProviderNotConfigured)
    }
}
