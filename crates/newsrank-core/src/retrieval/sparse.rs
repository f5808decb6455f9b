//! Sparse (BM25) retriever.

use std::sync::Arc;

use tracing::debug;

use crate::error::NewsrankResult;
use crate::traits::{CorpusStore, SparseIndex};
use crate::types::{rank_matches, RankedHit};

use super::bm25::{Bm25Config, Bm25Corpus, Bm25QueryBuilder};
use super::tokenizer::Tokenizer;

/// Tokenizes the query, builds a BM25 vector and searches the sparse index.
#[derive(Clone)]
pub struct SparseRetriever {
    tokenizer: Tokenizer,
    builder: Bm25QueryBuilder,
    k3: f32,
    corpus: Arc<dyn CorpusStore>,
    index: Arc<dyn SparseIndex>,
}

impl SparseRetriever {
    /// Create a new sparse retriever.
    pub fn new(
        tokenizer: Tokenizer,
        bm25: &Bm25Config,
        corpus: Arc<dyn CorpusStore>,
        index: Arc<dyn SparseIndex>,
    ) -> Self {
        Self {
            tokenizer,
            builder: Bm25QueryBuilder::new(bm25.max_terms),
            k3: bm25.k3,
            corpus,
            index,
        }
    }

    /// Return up to `top_k` hits by descending index score.
    ///
    /// A query with no tokens, or whose tokens produce an empty BM25
    /// vector, returns no hits without querying the index.
    pub async fn search(&self, query: &str, top_k: usize) -> NewsrankResult<Vec<RankedHit>> {
        let tokens = self.tokenizer.tokenize(query);
        if tokens.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut distinct = tokens.clone();
        distinct.sort();
        distinct.dedup();

        let (stats, terms) =
            tokio::try_join!(self.corpus.stats(), self.corpus.lookup_terms(&distinct))?;
        let corpus = Bm25Corpus::from_lookup(stats, terms, self.k3);

        let vector = self.builder.build(&tokens, &corpus);
        if vector.is_empty() {
            debug!(tokens = tokens.len(), "No usable BM25 terms; skipping sparse search");
            return Ok(Vec::new());
        }

        let matches = self.index.query(&vector, top_k).await?;
        debug!(terms = vector.len(), hits = matches.len(), top_k, "Sparse search complete");

        Ok(rank_matches(
            matches.into_iter().map(|m| (m.id, m.score)).collect(),
        ))
    }
}
