//! Dense and sparse vector index traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NewsrankResult;
use crate::types::SparseVector;

/// A match returned by a vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    /// Article identifier.
    pub id: String,
    /// Index-reported score, higher is better.
    pub score: f32,
}

impl IndexMatch {
    /// Create a new match.
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

/// Approximate nearest-neighbour search over dense embeddings.
#[async_trait]
pub trait DenseIndex: Send + Sync {
    /// Return the `top_k` nearest neighbours of `vector` by cosine
    /// similarity, ordered by descending score.
    async fn query(&self, vector: &[f32], top_k: usize) -> NewsrankResult<Vec<IndexMatch>>;
}

/// Nearest-neighbour search over sparse BM25 vectors.
#[async_trait]
pub trait SparseIndex: Send + Sync {
    /// Return the `top_k` best matches for `vector`, ordered by descending
    /// score.
    async fn query(&self, vector: &SparseVector, top_k: usize)
        -> NewsrankResult<Vec<IndexMatch>>;
}

/// Vector index configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: VectorIndexProvider,
    /// Index name.
    #[serde(default)]
    pub index_name: String,
    /// Data-plane host, e.g. `https://news-abc123.svc.us-east1-gcp.pinecone.io`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// API key (if not using environment variable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Namespace within the index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Vector index provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VectorIndexProvider {
    #[default]
    Pinecone,
}
