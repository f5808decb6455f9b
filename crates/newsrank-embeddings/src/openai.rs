//! OpenAI embedding provider implementation.

use async_trait::async_trait;

use newsrank_core::error::{NewsrankError, NewsrankResult};
use newsrank_core::traits::{Embedder, EmbedderConfig};

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};
#[cfg(feature = "openai")]
use newsrank_core::error::ErrorCode;

/// OpenAI embedding provider.
pub struct OpenAIEmbedder {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: EmbedderConfig,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder.
    ///
    /// The API key comes from the config, falling back to `OPENAI_API_KEY`.
    pub fn new(config: EmbedderConfig) -> NewsrankResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                NewsrankError::Configuration("OpenAI API key not found. Set OPENAI_API_KEY environment variable or provide api_key in config.".to_string())
            })?;

        #[cfg(feature = "openai")]
        let openai_config = if let Some(ref base_url) = config.base_url {
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(base_url)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };
        #[cfg(not(feature = "openai"))]
        let _ = api_key;

        #[cfg(feature = "openai")]
        let client = Client::with_config(openai_config);

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[cfg(feature = "openai")]
    async fn embed(&self, text: &str) -> NewsrankResult<Vec<f32>> {
        let request = CreateEmbeddingRequest {
            model: self.config.model.clone(),
            input: EmbeddingInput::String(text.to_string()),
            dimensions: self.requested_dimensions(),
            ..Default::default()
        };

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| NewsrankError::Embedding {
                message: format!("OpenAI embedding error: {}", e),
                code: error_code(&e),
                source: Some(Box::new(e)),
            })?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| NewsrankError::embedding("No embedding returned"))?;

        tracing::debug!(model = %self.config.model, dims = embedding.embedding.len(), "Query embedded");
        Ok(embedding.embedding)
    }

    #[cfg(not(feature = "openai"))]
    async fn embed(&self, _text: &str) -> NewsrankResult<Vec<f32>> {
        Err(NewsrankError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dims
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(feature = "openai")]
impl OpenAIEmbedder {
    /// Only the text-embedding-3 family accepts a `dimensions` parameter;
    /// it is sent when the configured size differs from the model's native one.
    fn requested_dimensions(&self) -> Option<u32> {
        let native = match self.config.model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            _ => return None,
        };
        (self.config.embedding_dims != native).then_some(self.config.embedding_dims as u32)
    }
}

/// Transport failures are connection errors; everything the API answered
/// with is a generation failure.
#[cfg(feature = "openai")]
fn error_code(err: &OpenAIError) -> ErrorCode {
    match err {
        OpenAIError::Reqwest(_) => ErrorCode::EmbConnectionFailed,
        _ => ErrorCode::EmbGenerationFailed,
    }
}
