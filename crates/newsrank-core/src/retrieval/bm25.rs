//! BM25 query-vector construction.
//!
//! Turns query tokens plus corpus statistics into a sparse vector whose
//! weights are `idf * (k3 + 1) * qtf / (k3 + qtf)`. The query-side
//! saturation keeps a term repeated many times from dominating linearly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::traits::{CorpusStats, TermStats};
use crate::types::SparseVector;

/// Default query-term saturation constant.
pub const DEFAULT_K3: f32 = 1000.0;

/// Default cap on distinct query terms.
pub const DEFAULT_MAX_TERMS: usize = 128;

/// BM25 query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    /// Query-term saturation constant.
    pub k3: f32,
    /// Maximum distinct terms kept from one query.
    pub max_terms: usize,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k3: DEFAULT_K3,
            max_terms: DEFAULT_MAX_TERMS,
        }
    }
}

/// Inverse document frequency: `ln((N - df + 0.5) / (df + 0.5) + 1)`.
pub fn idf(total_docs: u64, doc_freq: u64) -> f64 {
    let n = total_docs as f64;
    let df = doc_freq as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Request-scoped view of the corpus statistics a query needs.
#[derive(Debug, Clone)]
pub struct Bm25Corpus {
    term_ids: HashMap<String, u32>,
    doc_freqs: HashMap<String, u64>,
    /// Number of documents (N).
    pub total_docs: u64,
    /// Document-length constants, carried for completeness.
    pub k1: f32,
    pub b: f32,
    /// Query-term saturation constant.
    pub k3: f32,
}

impl Bm25Corpus {
    /// Create an empty corpus view over `total_docs` documents.
    pub fn new(total_docs: u64) -> Self {
        let defaults = CorpusStats::default();
        Self {
            term_ids: HashMap::new(),
            doc_freqs: HashMap::new(),
            total_docs,
            k1: defaults.k1,
            b: defaults.b,
            k3: DEFAULT_K3,
        }
    }

    /// Assemble from store lookups.
    pub fn from_lookup(stats: CorpusStats, terms: Vec<TermStats>, k3: f32) -> Self {
        let mut corpus = Self::new(stats.total_docs);
        corpus.k1 = stats.k1;
        corpus.b = stats.b;
        corpus.k3 = k3;
        for t in terms {
            corpus.term_ids.insert(t.term.clone(), t.term_id);
            corpus.doc_freqs.insert(t.term, t.doc_freq);
        }
        corpus
    }

    /// Register a term.
    pub fn with_term(mut self, term: impl Into<String>, term_id: u32, doc_freq: u64) -> Self {
        let term = term.into();
        self.term_ids.insert(term.clone(), term_id);
        self.doc_freqs.insert(term, doc_freq);
        self
    }

    /// Set the query-term saturation constant.
    pub fn with_k3(mut self, k3: f32) -> Self {
        self.k3 = k3;
        self
    }

    /// Term id and IDF, if the term resolves in both maps.
    fn resolve(&self, term: &str) -> Option<(u32, f64)> {
        let id = *self.term_ids.get(term)?;
        let df = *self.doc_freqs.get(term)?;
        Some((id, idf(self.total_docs, df)))
    }
}

/// Builds sparse BM25 query vectors.
#[derive(Debug, Clone)]
pub struct Bm25QueryBuilder {
    max_terms: usize,
}

impl Default for Bm25QueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TERMS)
    }
}

impl Bm25QueryBuilder {
    /// Create a builder keeping at most `max_terms` distinct terms.
    pub fn new(max_terms: usize) -> Self {
        Self { max_terms }
    }

    /// Build the query vector for `tokens`.
    ///
    /// Terms missing from the corpus and terms with non-positive IDF are
    /// dropped. An empty vector is valid output and means no sparse search
    /// is possible for this query.
    pub fn build(&self, tokens: &[String], corpus: &Bm25Corpus) -> SparseVector {
        // Distinct terms with their query frequency, in first-seen order.
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut terms: Vec<(&str, u32)> = Vec::new();
        for token in tokens {
            match positions.get(token.as_str()) {
                Some(&pos) => terms[pos].1 += 1,
                None => {
                    positions.insert(token.as_str(), terms.len());
                    terms.push((token.as_str(), 1));
                }
            }
        }

        if terms.len() > self.max_terms {
            let idf_of = |term: &str| {
                corpus
                    .resolve(term)
                    .map(|(_, idf)| idf)
                    .unwrap_or(f64::NEG_INFINITY)
            };
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| idf_of(b.0).total_cmp(&idf_of(a.0))));
            terms.truncate(self.max_terms);
        }

        let k3 = corpus.k3 as f64;
        let mut vector = SparseVector::with_capacity(terms.len());
        for (term, qtf) in terms {
            let Some((term_id, idf)) = corpus.resolve(term) else {
                continue;
            };
            if idf <= 0.0 {
                continue;
            }
            let qtf = qtf as f64;
            let weight = idf * ((k3 + 1.0) * qtf / (k3 + qtf));
            vector.push(term_id, weight as f32);
        }
        vector
    }
}
