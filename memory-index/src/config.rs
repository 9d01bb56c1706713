//! Configuration for the memory index.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lifelog_embeddings::{DEFAULT_DIMENSION, EmbeddingError, MAX_BATCH_SIZE, OpenAIProvider};

use crate::error::{IndexError, Result};

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the embedding model.
pub const MODEL_ENV: &str = "LIFELOG_EMBEDDING_MODEL";

/// Environment variable overriding the provider base URL.
pub const BASE_URL_ENV: &str = "LIFELOG_EMBEDDING_BASE_URL";

/// Configuration for the memory index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Location of the JSON store snapshot.
    pub store_path: PathBuf,

    /// Embedding provider configuration.
    pub provider: ProviderConfig,

    /// Search configuration.
    pub search: SearchConfig,

    /// Rebuild configuration.
    pub rebuild: RebuildConfig,
}

impl IndexConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_toml_str(&content)
    }

    /// Apply credential, model and base URL from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`, keyed by the `*_ENV` names.
    /// Blank values are ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = value(API_KEY_ENV) {
            self.provider.api_key = Some(key);
        }
        if let Some(model) = value(MODEL_ENV) {
            self.provider.model = model;
        }
        if let Some(url) = value(BASE_URL_ENV) {
            self.provider.base_url = url;
        }
        self
    }

    /// Reject values the index cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.provider.dimension == 0 {
            return Err(IndexError::Config("provider.dimension must be positive".to_string()));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.rebuild.batch_size) {
            return Err(IndexError::Config(format!(
                "rebuild.batch_size must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            store_path: dirs::data_dir()
                .unwrap_or_default()
                .join("lifelog/memory-store.json"),
            provider: ProviderConfig::default(),
            search: SearchConfig::default(),
            rebuild: RebuildConfig::default(),
        }
    }
}

/// Configuration for the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API credential. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,

    /// Model to request.
    pub model: String,

    /// Requested vector length.
    pub dimension: usize,

    /// Per-request timeout. Unset means the transport default (none).
    pub request_timeout_secs: Option<u64>,
}

impl ProviderConfig {
    /// Build the HTTP provider described by this configuration.
    pub fn build_provider(&self) -> Result<OpenAIProvider> {
        let mut client = reqwest::Client::builder();
        if let Some(secs) = self.request_timeout_secs {
            client = client.timeout(Duration::from_secs(secs));
        }
        let client = client.build().map_err(EmbeddingError::from)?;

        let provider = OpenAIProvider::new()
            .with_client(client)
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_dimension(self.dimension);

        Ok(match non_empty(self.api_key.as_deref()) {
            Some(key) => provider.with_api_key(key),
            None => provider,
        })
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: DEFAULT_DIMENSION,
            request_timeout_secs: None,
        }
    }
}

/// Configuration for search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result count used when a caller does not pass one.
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_limit: 10 }
    }
}

/// Configuration for rebuilds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuildConfig {
    /// Events composed and embedded per batch.
    pub batch_size: usize,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifelog_embeddings::EmbeddingProvider;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.provider.dimension, 384);
        assert_eq!(config.rebuild.batch_size, 100);
        assert_eq!(config.search.default_limit, 10);
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = IndexConfig::from_toml_str(
            r#"
            store_path = "/tmp/store.json"

            [provider]
            model = "my-model"
            api_key = "sk-test"
            request_timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.store_path, PathBuf::from("/tmp/store.json"));
        assert_eq!(config.provider.model, "my-model");
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.provider.request_timeout_secs, Some(30));
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(config.rebuild.batch_size, 100);
    }

    #[tokio::test]
    async fn test_load_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.toml");
        tokio::fs::write(
            &path,
            "[search]\ndefault_limit = 3\n\n[rebuild]\nbatch_size = 25\n",
        )
        .await
        .unwrap();

        let config = IndexConfig::load(&path).await.unwrap();
        assert_eq!(config.search.default_limit, 3);
        assert_eq!(config.rebuild.batch_size, 25);
        assert_eq!(config.provider.model, "text-embedding-3-small");

        let err = IndexConfig::load(dir.path().join("missing.toml")).await.unwrap_err();
        assert!(matches!(err, IndexError::Io(_)));
    }

    #[test]
    fn test_overrides_replace_provider_fields() {
        let vars = [
            (API_KEY_ENV, "sk-env"),
            (MODEL_ENV, "env-model"),
            (BASE_URL_ENV, "   "),
        ];
        let config = IndexConfig::default().with_overrides_from(|name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
        });

        assert_eq!(config.provider.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.provider.model, "env-model");
        assert_eq!(config.provider.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_overrides_without_values_keep_config() {
        let mut config = IndexConfig::default();
        config.provider.api_key = Some("sk-file".to_string());

        let config = config.with_overrides_from(|_| None);
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-file"));
        assert_eq!(config.provider.model, "text-embedding-3-small");
    }

    #[test]
    fn test_invalid_batch_size_rejected() {
        let err = IndexConfig::from_toml_str("[rebuild]\nbatch_size = 250\n").unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = IndexConfig::default();
        config.provider.api_key = Some("secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_build_provider_respects_credential() {
        let mut config = ProviderConfig::default();
        assert!(!config.build_provider().unwrap().is_configured());

        config.api_key = Some("   ".to_string());
        assert!(!config.build_provider().unwrap().is_configured());

        config.api_key = Some("sk-test".to_string());
        config.model = "m".to_string();
        let provider = config.build_provider().unwrap();
        assert!(provider.is_configured());
        assert_eq!(provider.model(), "m");
        assert_eq!(provider.dimension(), 384);
    }
}
