//! Builds the search engine from configuration.

use std::sync::Arc;

use newsrank_core::error::NewsrankResult;
use newsrank_core::store::open_connection;
use newsrank_core::{HybridSearchEngine, NewsrankConfig, SqliteArticleStore, SqliteCorpusStore};
use newsrank_embeddings::EmbedderFactory;
use newsrank_vector_stores::VectorIndexFactory;
use tracing::info;

/// Create a [`HybridSearchEngine`] wired to the configured providers.
///
/// The article and corpus stores share one SQLite connection.
pub fn build_engine(config: &NewsrankConfig) -> NewsrankResult<HybridSearchEngine> {
    let embedder = EmbedderFactory::create(config.embedder.provider, config.embedder.config.clone())?;
    let dense_index = VectorIndexFactory::dense(&config.dense_index)?;
    let sparse_index = VectorIndexFactory::sparse(&config.sparse_index)?;

    let conn = open_connection(&config.database_path)?;
    let articles = SqliteArticleStore::with_connection(conn.clone())?;
    let corpus = SqliteCorpusStore::with_connection(conn)?;

    info!(
        database = %config.database_path.display(),
        dense_index = %config.dense_index.index_name,
        sparse_index = %config.sparse_index.index_name,
        "Search engine configured"
    );

    HybridSearchEngine::from_providers(
        embedder,
        dense_index,
        Arc::new(corpus),
        sparse_index,
        Arc::new(articles),
        config.search.clone(),
    )
}
