//! Ollama embedding provider implementation.

use async_trait::async_trait;

use newsrank_core::error::{NewsrankError, NewsrankResult};
use newsrank_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "ollama")]
use ollama_rs::{generation::embeddings::request::GenerateEmbeddingsRequest, Ollama};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama embedding provider.
pub struct OllamaEmbedder {
    #[cfg(feature = "ollama")]
    client: Ollama,
    endpoint: String,
    config: EmbedderConfig,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder.
    pub fn new(config: EmbedderConfig) -> NewsrankResult<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        let url = url::Url::parse(&base_url)
            .map_err(|e| NewsrankError::Configuration(format!("Invalid Ollama URL: {}", e)))?;

        let host = url.host_str().unwrap_or("localhost").to_string();
        let port = url.port().unwrap_or(11434);
        let endpoint = format!("{}://{}", url.scheme(), host);

        #[cfg(feature = "ollama")]
        let client = Ollama::new(endpoint.clone(), port);

        Ok(Self {
            #[cfg(feature = "ollama")]
            client,
            endpoint: format!("{}:{}", endpoint, port),
            config,
        })
    }

    /// The `scheme://host:port` the embedder talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    #[cfg(feature = "ollama")]
    async fn embed(&self, text: &str) -> NewsrankResult<Vec<f32>> {
        let request = GenerateEmbeddingsRequest::new(self.config.model.clone(), text.to_string().into());

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| NewsrankError::embedding(format!("Ollama embedding error: {}", e)))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| NewsrankError::embedding("No embedding returned"))
    }

    #[cfg(not(feature = "ollama"))]
    async fn embed(&self, _text: &str) -> NewsrankResult<Vec<f32>> {
        Err(NewsrankError::Configuration(
            "Ollama feature not enabled. Enable the 'ollama' feature.".to_string(),
        ))
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
