//! Search mode definitions and engine configuration.
//!
//! Three modes:
//! - Dense: embedding similarity only
//! - Sparse: BM25 only
//! - Hybrid: both, concurrently, merged with RRF; degrades to whichever
//!   retriever succeeded

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::bm25::Bm25Config;
use super::cache::CacheConfig;
use super::fusion::DEFAULT_RRF_K;
use super::hydrator::{DEFAULT_DATE_WINDOWS, MAX_WINDOW_DAYS};
use super::recency::RecencyConfig;
use super::tokenizer::TokenizerConfig;

/// Search mode determines which retrievers run and how results merge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchMode {
    /// Dense embedding search only.
    Dense,
    /// BM25 sparse search only.
    Sparse,
    /// Dense + sparse with reciprocal rank fusion.
    #[default]
    Hybrid,
}

impl SearchMode {
    /// Pick the mode from the HTTP request flags. Sparse-only wins over
    /// hybrid; with neither flag set the search is dense.
    pub fn from_flags(use_hybrid_search: bool, use_sparse_only: bool) -> Self {
        if use_sparse_only {
            Self::Sparse
        } else if use_hybrid_search {
            Self::Hybrid
        } else {
            Self::Dense
        }
    }

    /// Check if this mode runs the dense retriever.
    pub fn uses_dense(&self) -> bool {
        matches!(self, Self::Dense | Self::Hybrid)
    }

    /// Check if this mode runs the sparse retriever.
    pub fn uses_sparse(&self) -> bool {
        matches!(self, Self::Sparse | Self::Hybrid)
    }

    /// Check if this mode uses RRF fusion.
    pub fn uses_rrf(&self) -> bool {
        matches!(self, Self::Hybrid)
    }
}

/// Configuration for the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// RRF constant k.
    pub rrf_k: f32,
    /// Candidates fetched per retriever, as a multiple of the limit.
    pub oversample_factor: usize,
    /// Floor on candidates fetched per retriever.
    pub min_candidates: usize,
    /// Hydration windows in days, narrowest first.
    pub date_windows_days: Vec<u32>,
    /// Recency blend.
    pub recency: RecencyConfig,
    /// BM25 query construction.
    pub bm25: Bm25Config,
    /// Query tokenization.
    pub tokenizer: TokenizerConfig,
    /// Drop articles repeating an earlier article's content fingerprint.
    pub dedup_by_fingerprint: bool,
    /// Limit used when a request does not give one.
    pub default_limit: usize,
    /// Largest accepted limit.
    pub max_limit: usize,
    /// Result cache; disabled when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rrf_k: DEFAULT_RRF_K,
            oversample_factor: 5,
            min_candidates: 50,
            date_windows_days: DEFAULT_DATE_WINDOWS.to_vec(),
            recency: RecencyConfig::default(),
            bm25: Bm25Config::default(),
            tokenizer: TokenizerConfig::default(),
            dedup_by_fingerprint: true,
            default_limit: 10,
            max_limit: 100,
            cache: None,
        }
    }
}

impl SearchConfig {
    /// Candidates each retriever is asked for when the caller wants `limit`.
    pub fn candidate_count(&self, limit: usize) -> usize {
        limit
            .saturating_mul(self.oversample_factor)
            .max(self.min_candidates)
    }

    /// Set the date windows.
    pub fn with_date_windows(mut self, windows: Vec<u32>) -> Self {
        self.date_windows_days = windows;
        self
    }

    /// Enable the result cache.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Validate configuration values are in valid ranges.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.rrf_k > 0.0) {
            return Err("rrf_k must be positive");
        }
        if self.oversample_factor == 0 {
            return Err("oversample_factor must be at least 1");
        }
        if self.date_windows_days.is_empty() {
            return Err("date_windows_days must not be empty");
        }
        if self.date_windows_days.windows(2).any(|w| w[0] >= w[1]) {
            return Err("date_windows_days must be strictly increasing");
        }
        if self.date_windows_days.iter().any(|&d| d > MAX_WINDOW_DAYS) {
            return Err("date_windows_days entries must not exceed 36500");
        }
        if !(0.0..=1.0).contains(&self.recency.weight) {
            return Err("recency.weight must be between 0.0 and 1.0");
        }
        if !(self.recency.half_life_days > 0.0) {
            return Err("recency.half_life_days must be positive");
        }
        if self.bm25.max_terms == 0 {
            return Err("bm25.max_terms must be at least 1");
        }
        if !(self.bm25.k3 >= 0.0) {
            return Err("bm25.k3 must be non-negative");
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err("default_limit must be between 1 and max_limit");
        }
        if let Some(cache) = &self.cache {
            if cache.max_entries == 0 {
                return Err("cache.max_entries must be at least 1");
            }
        }
        Ok(())
    }
}
