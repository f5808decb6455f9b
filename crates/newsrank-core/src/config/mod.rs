//! Configuration system for newsrank.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NewsrankError, NewsrankResult};
use crate::retrieval::SearchConfig;
use crate::traits::{EmbedderConfig, EmbedderProvider, VectorIndexConfig};

/// Environment variable naming a config file to load instead of the
/// environment.
pub const CONFIG_PATH_ENV: &str = "NEWSRANK_CONFIG";

/// Embedder provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderProviderConfig {
    /// Provider type.
    pub provider: EmbedderProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: EmbedderConfig,
}

impl Default for EmbedderProviderConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderProvider::OpenAI,
            config: EmbedderConfig::default(),
        }
    }
}

/// Main newsrank configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsrankConfig {
    /// Retrieval and ranking tunables.
    pub search: SearchConfig,
    /// Query embedder.
    pub embedder: EmbedderProviderConfig,
    /// Dense (embedding) index.
    pub dense_index: VectorIndexConfig,
    /// Sparse (BM25) index.
    pub sparse_index: VectorIndexConfig,
    /// SQLite database holding articles and BM25 corpus statistics.
    pub database_path: PathBuf,
}

impl Default for NewsrankConfig {
    fn default() -> Self {
        let newsrank_dir = dirs::home_dir()
            .map(|h| h.join(".newsrank"))
            .unwrap_or_else(|| PathBuf::from(".newsrank"));

        Self {
            search: SearchConfig::default(),
            embedder: EmbedderProviderConfig::default(),
            dense_index: VectorIndexConfig {
                index_name: "news-dense".to_string(),
                ..Default::default()
            },
            sparse_index: VectorIndexConfig {
                index_name: "news-sparse".to_string(),
                ..Default::default()
            },
            database_path: newsrank_dir.join("news.db"),
        }
    }
}

impl NewsrankConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> NewsrankResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| NewsrankError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| NewsrankError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| NewsrankError::Configuration(e.to_string())),
            _ => Err(NewsrankError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Load from the file named by `NEWSRANK_CONFIG` if set, otherwise
    /// from the environment, and validate the result.
    pub fn load() -> NewsrankResult<Self> {
        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Embedder configuration
        if let Some(provider) = lookup("NEWSRANK_EMBEDDER_PROVIDER") {
            self.embedder.provider = match provider.to_lowercase().as_str() {
                "ollama" => EmbedderProvider::Ollama,
                _ => EmbedderProvider::OpenAI,
            };
        }
        if let Some(model) = lookup("NEWSRANK_EMBEDDER_MODEL") {
            self.embedder.config.model = model;
        }
        if let Some(dims) = lookup("NEWSRANK_EMBEDDING_DIMS").and_then(|d| d.parse().ok()) {
            self.embedder.config.embedding_dims = dims;
        }
        if let Some(url) = lookup("NEWSRANK_EMBEDDER_BASE_URL") {
            self.embedder.config.base_url = Some(url);
        }
        if let Some(api_key) = lookup("OPENAI_API_KEY") {
            self.embedder.config.api_key = Some(api_key);
        }

        // Vector index configuration
        if let Some(api_key) = lookup("PINECONE_API_KEY") {
            self.dense_index.api_key = Some(api_key.clone());
            self.sparse_index.api_key = Some(api_key);
        }
        if let Some(host) = lookup("NEWSRANK_DENSE_INDEX_HOST") {
            self.dense_index.host = Some(host);
        }
        if let Some(host) = lookup("NEWSRANK_SPARSE_INDEX_HOST") {
            self.sparse_index.host = Some(host);
        }
        if let Some(name) = lookup("NEWSRANK_DENSE_INDEX_NAME") {
            self.dense_index.index_name = name;
        }
        if let Some(name) = lookup("NEWSRANK_SPARSE_INDEX_NAME") {
            self.sparse_index.index_name = name;
        }
        if let Some(namespace) = lookup("NEWSRANK_INDEX_NAMESPACE") {
            self.dense_index.namespace = Some(namespace.clone());
            self.sparse_index.namespace = Some(namespace);
        }

        // Search tunables
        if let Some(limit) = lookup("NEWSRANK_DEFAULT_LIMIT").and_then(|v| v.parse().ok()) {
            self.search.default_limit = limit;
        }
        if let Some(limit) = lookup("NEWSRANK_MAX_LIMIT").and_then(|v| v.parse().ok()) {
            self.search.max_limit = limit;
        }

        // Database path
        if let Some(path) = lookup("NEWSRANK_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }

        self
    }

    /// Check every section for out-of-range values.
    pub fn validate(&self) -> NewsrankResult<()> {
        self.search
            .validate()
            .map_err(|e| NewsrankError::Configuration(format!("search: {}", e)))?;
        if self.embedder.config.embedding_dims == 0 {
            return Err(NewsrankError::Configuration(
                "embedder: embedding_dims must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> NewsrankConfigBuilder {
        NewsrankConfigBuilder::default()
    }
}

/// Builder for NewsrankConfig.
#[derive(Default)]
pub struct NewsrankConfigBuilder {
    config: NewsrankConfig,
}

impl NewsrankConfigBuilder {
    /// Set search configuration.
    pub fn search(mut self, config: SearchConfig) -> Self {
        self.config.search = config;
        self
    }

    /// Set embedder configuration.
    pub fn embedder(mut self, config: EmbedderProviderConfig) -> Self {
        self.config.embedder = config;
        self
    }

    /// Set dense index configuration.
    pub fn dense_index(mut self, config: VectorIndexConfig) -> Self {
        self.config.dense_index = config;
        self
    }

    /// Set sparse index configuration.
    pub fn sparse_index(mut self, config: VectorIndexConfig) -> Self {
        self.config.sparse_index = config;
        self
    }

    /// Set the database path.
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> NewsrankConfig {
        self.config
    }
}
