//! BM25 corpus statistics store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NewsrankResult;

/// Per-term corpus statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStats {
    /// The normalized term.
    pub term: String,
    /// Column of the term in the sparse index.
    pub term_id: u32,
    /// Number of documents containing the term.
    pub doc_freq: u64,
}

/// Corpus-wide BM25 statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of documents in the corpus (N).
    pub total_docs: u64,
    /// Term-frequency saturation used at indexing time.
    pub k1: f32,
    /// Document-length normalization used at indexing time.
    pub b: f32,
}

impl Default for CorpusStats {
    fn default() -> Self {
        Self {
            total_docs: 0,
            k1: 1.2,
            b: 0.75,
        }
    }
}

/// Source of the BM25 statistics that accompany the sparse index.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Resolve the given terms. Unknown terms are omitted from the result.
    async fn lookup_terms(&self, terms: &[String]) -> NewsrankResult<Vec<TermStats>>;

    /// Corpus-wide statistics.
    async fn stats(&self) -> NewsrankResult<CorpusStats>;
}
