//! newsrank-core - Core library for newsrank.
//!
//! This crate provides the types, provider traits, stores and the hybrid
//! retrieval engine behind newsrank's article search.
//!
//! # Example
//!
//! ```ignore
//! use newsrank_core::{HybridSearchEngine, SearchConfig, SearchMode, SearchRequest};
//!
//! let engine = HybridSearchEngine::from_providers(
//!     embedder, dense_index, corpus, sparse_index, articles, SearchConfig::default(),
//! )?;
//!
//! let request = SearchRequest::new("central bank rate decision").with_limit(10);
//! let outcome = engine.search(&request).await?;
//! for scored in &outcome.articles {
//!     println!("{:.3} {}", scored.display_score, scored.article.title);
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod retrieval;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{EmbedderProviderConfig, NewsrankConfig};
pub use error::{ErrorCode, NewsrankError, NewsrankResult};
pub use events::{EventBus, EventSubscriber, SearchEvent};
pub use retrieval::{
    CacheConfig, HybridSearchEngine, SearchCache, SearchConfig, SearchMode, SearchOutcome,
    SearchRequest,
};
pub use store::{SqliteArticleStore, SqliteCorpusStore};
pub use traits::{
    ArticleStore, CorpusStats, CorpusStore, DenseIndex, Embedder, EmbedderConfig,
    EmbedderProvider, IndexMatch, SparseIndex, TermStats, VectorIndexConfig, VectorIndexProvider,
};
pub use types::{Article, Citation, FusedHit, RankedHit, ScoredArticle, SparseVector};
