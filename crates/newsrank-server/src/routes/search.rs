//! Search endpoint.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;
use newsrank_core::{ScoredArticle, SearchMode, SearchRequest};

/// Request body for searching articles.
#[derive(Debug, Deserialize)]
pub struct SearchBody {
    /// The search query.
    pub query: String,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Fuse dense and sparse results.
    #[serde(default = "default_use_hybrid")]
    pub use_hybrid_search: bool,
    /// Lexical search only; takes precedence over `use_hybrid_search`.
    #[serde(default)]
    pub use_sparse_only: bool,
}

fn default_use_hybrid() -> bool {
    true
}

impl SearchBody {
    pub fn mode(&self) -> SearchMode {
        SearchMode::from_flags(self.use_hybrid_search, self.use_sparse_only)
    }
}

/// Response for searching articles.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub articles: Vec<ScoredArticle>,
    pub count: usize,
    pub search_method: SearchMode,
}

/// Search articles.
/// POST /search
pub async fn search_articles(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> ApiResult<Json<SearchResponse>> {
    let mut request = SearchRequest::new(body.query.clone()).with_mode(body.mode());
    if let Some(limit) = body.limit {
        request = request.with_limit(limit);
    }

    let outcome = state
        .engine
        .search_with_cancel(&request, &state.request_token())
        .await?;

    Ok(Json(SearchResponse {
        count: outcome.len(),
        search_method: outcome.method,
        articles: outcome.articles,
    }))
}
