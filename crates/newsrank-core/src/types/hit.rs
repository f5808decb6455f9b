//! Ranked and scored search hits.

use serde::{Deserialize, Serialize};

use super::article::Article;

/// A hit from a single retrieval method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    /// Article identifier.
    pub article_id: String,
    /// 1-based position in the source list.
    pub rank: usize,
    /// Method-specific score; not comparable across methods.
    pub score: f32,
}

impl RankedHit {
    /// Create a new ranked hit.
    pub fn new(article_id: impl Into<String>, rank: usize, score: f32) -> Self {
        Self {
            article_id: article_id.into(),
            rank,
            score,
        }
    }
}

/// Assign 1-based ranks to `(id, score)` matches, highest score first.
///
/// The sort is stable, so ties keep the order the index reported them in.
pub fn rank_matches(mut matches: Vec<(String, f32)>) -> Vec<RankedHit> {
    matches.sort_by(|a, b| b.1.total_cmp(&a.1));
    matches
        .into_iter()
        .enumerate()
        .map(|(i, (id, score))| RankedHit::new(id, i + 1, score))
        .collect()
}

/// A hit after reciprocal rank fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    /// Article identifier.
    pub article_id: String,
    /// Sum of `1 / (k + rank)` over every list containing the article.
    pub fused_score: f32,
    /// Best (lowest) rank the article held in any source list.
    pub best_rank: usize,
}

/// An article with its final display score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: Article,
    /// `λ·recency + (1-λ)·similarity`.
    pub display_score: f32,
}
