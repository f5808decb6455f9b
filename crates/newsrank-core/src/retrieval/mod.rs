//! Hybrid retrieval for news articles.
//!
//! Provides three search modes:
//! - Dense: query embedding against the dense index
//! - Sparse: BM25 query vector against the sparse index
//! - Hybrid: both concurrently, merged with reciprocal rank fusion
//!
//! Every mode hydrates the ranked ids through expanding date windows and
//! ranks the articles by a recency-weighted similarity.

mod bm25;
mod cache;
mod dense;
mod engine;
mod fusion;
mod hydrator;
mod modes;
mod recency;
mod sparse;
mod tokenizer;

pub use bm25::{idf, Bm25Config, Bm25Corpus, Bm25QueryBuilder, DEFAULT_K3, DEFAULT_MAX_TERMS};
pub use cache::{CacheConfig, SearchCache};
pub use dense::DenseRetriever;
pub use engine::{HybridSearchEngine, SearchOutcome, SearchRequest};
pub use fusion::{RrfFusion, DEFAULT_RRF_K};
pub use hydrator::{ResultHydrator, DEFAULT_DATE_WINDOWS, MAX_WINDOW_DAYS};
pub use modes::{SearchConfig, SearchMode};
pub use recency::{RecencyConfig, RecencyScorer};
pub use sparse::SparseRetriever;
pub use tokenizer::{Tokenizer, TokenizerConfig};
