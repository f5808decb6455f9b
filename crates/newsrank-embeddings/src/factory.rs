//! Factory for creating embedding providers.

use std::sync::Arc;

use newsrank_core::error::NewsrankResult;
use newsrank_core::traits::{Embedder, EmbedderConfig, EmbedderProvider};
use tracing::info;

use crate::ollama::OllamaEmbedder;
use crate::openai::OpenAIEmbedder;

/// Factory for creating embedding providers.
pub struct EmbedderFactory;

impl EmbedderFactory {
    /// Create an embedder from the given configuration.
    pub fn create(
        provider: EmbedderProvider,
        config: EmbedderConfig,
    ) -> NewsrankResult<Arc<dyn Embedder>> {
        info!(?provider, model = %config.model, dims = config.embedding_dims, "Creating embedder");
        match provider {
            EmbedderProvider::OpenAI => {
                let embedder = OpenAIEmbedder::new(config)?;
                Ok(Arc::new(embedder))
            }
            EmbedderProvider::Ollama => {
                let embedder = OllamaEmbedder::new(config)?;
                Ok(Arc::new(embedder))
            }
        }
    }

    /// Create an OpenAI embedder with default configuration.
    pub fn openai() -> NewsrankResult<Arc<dyn Embedder>> {
        Self::create(EmbedderProvider::OpenAI, EmbedderConfig::default())
    }

    /// Create an OpenAI embedder with a specific model.
    pub fn openai_with_model(
        model: impl Into<String>,
        dims: usize,
    ) -> NewsrankResult<Arc<dyn Embedder>> {
        let config = EmbedderConfig {
            model: model.into(),
            embedding_dims: dims,
            ..Default::default()
        };
        Self::create(EmbedderProvider::OpenAI, config)
    }

    /// Create an Ollama embedder with default configuration.
    pub fn ollama() -> NewsrankResult<Arc<dyn Embedder>> {
        Self::ollama_with_model("nomic-embed-text", 768)
    }

    /// Create an Ollama embedder with a specific model.
    pub fn ollama_with_model(
        model: impl Into<String>,
        dims: usize,
    ) -> NewsrankResult<Arc<dyn Embedder>> {
        let config = EmbedderConfig {
            model: model.into(),
            embedding_dims: dims,
            ..Default::default()
        };
        Self::create(EmbedderProvider::Ollama, config)
    }
}
