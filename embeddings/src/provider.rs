//! Embedding providers.
//!
//! A provider turns text into vectors. The trait supplies the batching
//! rules (input truncation, sub-batch partitioning, order restoration) so
//! an implementation only has to perform one provider call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EmbeddingError, Result};
use crate::{DEFAULT_DIMENSION, Embedding, MAX_BATCH_SIZE, MAX_INPUT_CHARS, truncate_chars};

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Model identifier stored alongside every vector this provider makes.
    fn model(&self) -> &str;

    /// Length of the vectors this provider returns.
    fn dimension(&self) -> usize;

    /// Check if the provider has a credential configured.
    fn is_configured(&self) -> bool;

    /// Perform a single provider call.
    ///
    /// `texts` holds at most [`MAX_BATCH_SIZE`] already-truncated inputs.
    /// The returned vectors must be in the same order as `texts`; the call
    /// either yields every vector or fails as a whole.
    async fn request_embeddings(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Generate an embedding for one text.
    async fn embed_one(&self, text: &str) -> Result<Embedding> {
        if !self.is_configured() {
            return Err(EmbeddingError::ProviderNotConfigured);
        }

        let input = truncate_chars(text, MAX_INPUT_CHARS);
        let vector = self
            .request_embeddings(&[input])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                EmbeddingError::InvalidResponse("no embedding in response".to_string())
            })?;
        check_dimension(&vector, self.dimension())?;
        Ok(vector)
    }

    /// Generate embeddings for many texts, in input order.
    ///
    /// Inputs are sent in sequential sub-batches of [`MAX_BATCH_SIZE`]. A
    /// failing sub-batch aborts the call; vectors from earlier sub-batches
    /// are dropped with it, so callers that need partial progress should
    /// submit batches no larger than [`MAX_BATCH_SIZE`] themselves. A vector
    /// whose length differs from [`dimension`](Self::dimension) fails the
    /// call the same way.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if !self.is_configured() {
            return Err(EmbeddingError::ProviderNotConfigured);
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for (batch, chunk) in texts.chunks(MAX_BATCH_SIZE).enumerate() {
            let inputs: Vec<&str> = chunk
                .iter()
                .map(|text| truncate_chars(text, MAX_INPUT_CHARS))
                .collect();

            debug!(
                "Requesting sub-batch {batch} from {} with {} texts",
                self.name(),
                inputs.len()
            );
            let vectors = self.request_embeddings(&inputs).await?;
            if vectors.len() != inputs.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected {} embeddings, got {}",
                    inputs.len(),
                    vectors.len()
                )));
            }
            for vector in &vectors {
                check_dimension(vector, self.dimension())?;
            }
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }
}

fn check_dimension(vector: &[f32], expected: usize) -> Result<()> {
    if vector.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// OpenAI-compatible embedding provider.
pub struct OpenAIProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model to request.
    model: String,

    /// Requested output dimensionality.
    dimension: usize,
}

impl OpenAIProvider {
    /// Create a provider with default endpoint and model and no credential.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            model: "text-embedding-3-small".to_string(),
            dimension: DEFAULT_DIMENSION,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the requested output dimensionality.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn request_embeddings(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Generating embeddings for {} texts with model: {}",
            texts.len(),
            self.model
        );

        let body = OpenAIEmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimension,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let result: OpenAIEmbeddingResponse = response.json().await?;
        let embeddings = order_by_index(result.data, texts.len(), self.dimension)?;

        info!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }
}

/// Restore submission order from the provider's `index` field.
///
/// The provider is free to answer in any order, so the response is only
/// trusted once every input position `0..expected` is accounted for
/// exactly once.
fn order_by_index(
    mut data: Vec<OpenAIEmbeddingData>,
    expected: usize,
    dimension: usize,
) -> Result<Vec<Embedding>> {
    if data.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {expected} embeddings, got {}",
            data.len()
        )));
    }

    data.sort_by_key(|item| item.index);

    for (position, item) in data.iter().enumerate() {
        if item.index != position {
            return Err(EmbeddingError::InvalidResponse(format!(
                "missing embedding for input {position}"
            )));
        }
        if item.embedding.len() != dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dimension,
                actual: item.embedding.len(),
            });
        }
    }

    Ok(data.into_iter().map(|item| item.embedding).collect())
}

/// OpenAI API request format.
#[derive(Debug, Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    dimensions: usize,
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    #[serde(alias = "vector")]
    embedding: Vec<f32>,
    index: usize,
}
