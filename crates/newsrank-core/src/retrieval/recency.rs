//! Recency-weighted display scoring.
//!
//! `display = λ·recency + (1-λ)·similarity`, where
//! `recency = exp(-ln(2)·age_days/half_life_days)`. A scorer captures "now"
//! once so every article in a batch is aged against the same instant.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::types::{Article, ScoredArticle};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Recency blend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecencyConfig {
    /// Weight λ of the recency term, in [0, 1].
    pub weight: f32,
    /// Age at which recency halves.
    pub half_life_days: f32,
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self {
            weight: 0.2,
            half_life_days: 14.0,
        }
    }
}

/// Pure scorer bound to a single request's "now".
#[derive(Debug, Clone)]
pub struct RecencyScorer {
    weight: f64,
    half_life_days: f64,
    now: DateTime<Utc>,
}

impl RecencyScorer {
    /// Create a scorer that ages articles relative to `now`.
    pub fn new(config: &RecencyConfig, now: DateTime<Utc>) -> Self {
        Self {
            weight: config.weight as f64,
            half_life_days: config.half_life_days as f64,
            now,
        }
    }

    /// The instant this scorer measures age from.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Age in fractional days; articles dated in the future count as age 0.
    pub fn age_days(&self, published_at: DateTime<Utc>) -> f64 {
        let millis = (self.now - published_at).num_milliseconds().max(0);
        millis as f64 / MILLIS_PER_DAY
    }

    /// Exponential decay in (0, 1].
    pub fn recency(&self, published_at: DateTime<Utc>) -> f64 {
        (-std::f64::consts::LN_2 * self.age_days(published_at) / self.half_life_days).exp()
    }

    /// Display score for an article at the given retrieval similarity.
    pub fn score(&self, article: &Article, similarity: f32) -> f32 {
        let recency = self.recency(article.published_at);
        (self.weight * recency + (1.0 - self.weight) * similarity as f64) as f32
    }

    /// Score every article and sort by descending display score.
    ///
    /// The sort is stable, so equal scores keep their incoming order.
    pub fn rank<F>(&self, articles: Vec<Article>, similarity: F) -> Vec<ScoredArticle>
    where
        F: Fn(&Article) -> f32,
    {
        let mut scored: Vec<ScoredArticle> = articles
            .into_iter()
            .map(|article| {
                let display_score = self.score(&article, similarity(&article));
                ScoredArticle {
                    article,
                    display_score,
                }
            })
            .collect();
        scored.sort_by(|a, b| OrderedFloat(b.display_score).cmp(&OrderedFloat(a.display_score)));
        scored
    }
}
