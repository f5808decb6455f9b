//! Relational article store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::NewsrankResult;
use crate::types::Article;

/// Resolves article ids to full records.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Fetch the articles among `ids` published within `[start, end]`,
    /// with citations attached. Result order is unspecified.
    async fn find_by_ids_in_range(
        &self,
        ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> NewsrankResult<Vec<Article>>;
}
