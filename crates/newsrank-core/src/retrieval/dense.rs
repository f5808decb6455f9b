//! Dense (embedding) retriever.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ErrorCode, NewsrankError, NewsrankResult};
use crate::traits::{DenseIndex, Embedder};
use crate::types::{rank_matches, RankedHit};

/// Embeds the query and searches the dense index.
#[derive(Clone)]
pub struct DenseRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn DenseIndex>,
}

impl DenseRetriever {
    /// Create a new dense retriever.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn DenseIndex>) -> Self {
        Self { embedder, index }
    }

    /// Return up to `top_k` hits by descending cosine similarity.
    ///
    /// Blank queries return no hits without calling the embedder. Embedder
    /// and index failures propagate unchanged.
    pub async fn search(&self, query: &str, top_k: usize) -> NewsrankResult<Vec<RankedHit>> {
        if query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        let expected = self.embedder.dimension();
        if expected != 0 && embedding.len() != expected {
            return Err(NewsrankError::Embedding {
                message: format!(
                    "{} returned {} dimensions, expected {}",
                    self.embedder.model_name(),
                    embedding.len(),
                    expected
                ),
                code: ErrorCode::EmbDimensionMismatch,
                source: None,
            });
        }

        let matches = self.index.query(&embedding, top_k).await?;
        debug!(hits = matches.len(), top_k, "Dense search complete");

        Ok(rank_matches(
            matches.into_iter().map(|m| (m.id, m.score)).collect(),
        ))
    }
}
