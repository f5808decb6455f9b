//! Hybrid search engine orchestrating dense, sparse and fused retrieval.
//!
//! Every mode runs the same tail: hydrate the ranked ids inside the date
//! windows, drop fingerprint duplicates, re-score with the recency blend,
//! truncate to the limit. Only the candidate list and the similarity used
//! for re-scoring differ between modes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{NewsrankError, NewsrankResult};
use crate::events::{EventBus, SearchCompletedEvent, SearchDegradedEvent, SearchEvent};
use crate::traits::{ArticleStore, CorpusStore, DenseIndex, Embedder, SparseIndex};
use crate::types::{Article, FusedHit, RankedHit, ScoredArticle};

use super::cache::{normalize_query, SearchCache};
use super::dense::DenseRetriever;
use super::fusion::RrfFusion;
use super::hydrator::ResultHydrator;
use super::modes::{SearchConfig, SearchMode};
use super::recency::RecencyScorer;
use super::sparse::SparseRetriever;
use super::tokenizer::Tokenizer;

/// A search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query.
    pub query: String,
    /// Maximum results; the configured default when absent.
    pub limit: Option<usize>,
    /// Retrieval mode.
    #[serde(default)]
    pub mode: SearchMode,
}

impl SearchRequest {
    /// Create a hybrid request with the default limit.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
            mode: SearchMode::Hybrid,
        }
    }

    /// Set the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the retrieval mode.
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Ranked articles plus the mode that actually produced them.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub articles: Vec<ScoredArticle>,
    /// Differs from the requested mode when hybrid search degraded.
    pub method: SearchMode,
}

impl SearchOutcome {
    /// An outcome with no articles.
    pub fn empty(method: SearchMode) -> Self {
        Self {
            articles: Vec::new(),
            method,
        }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Ranked candidate ids and the similarity each one is re-scored with.
struct Candidates {
    method: SearchMode,
    ids: Vec<String>,
    similarity: HashMap<String, f32>,
}

impl Candidates {
    fn from_dense(hits: Vec<RankedHit>) -> Self {
        Self {
            method: SearchMode::Dense,
            similarity: raw_similarity(&hits),
            ids: hits.into_iter().map(|h| h.article_id).collect(),
        }
    }

    fn from_sparse(hits: Vec<RankedHit>) -> Self {
        Self {
            method: SearchMode::Sparse,
            similarity: normalized_similarity(&hits),
            ids: hits.into_iter().map(|h| h.article_id).collect(),
        }
    }

    /// Dense cosine similarity where available, otherwise the
    /// max-normalized sparse score.
    fn from_fused(fused: Vec<FusedHit>, dense: &[RankedHit], sparse: &[RankedHit]) -> Self {
        let mut similarity = normalized_similarity(sparse);
        similarity.extend(raw_similarity(dense));
        Self {
            method: SearchMode::Hybrid,
            ids: fused.into_iter().map(|h| h.article_id).collect(),
            similarity,
        }
    }

    fn similarity_of(&self, id: &str) -> f32 {
        self.similarity.get(id).copied().unwrap_or(0.0)
    }
}

fn raw_similarity(hits: &[RankedHit]) -> HashMap<String, f32> {
    let mut similarity = HashMap::with_capacity(hits.len());
    for hit in hits {
        similarity.entry(hit.article_id.clone()).or_insert(hit.score);
    }
    similarity
}

fn normalized_similarity(hits: &[RankedHit]) -> HashMap<String, f32> {
    let top = hits.iter().map(|h| h.score).fold(0.0f32, f32::max);
    let mut similarity = HashMap::with_capacity(hits.len());
    for hit in hits {
        let normalized = if top > 0.0 { hit.score / top } else { 0.0 };
        similarity.entry(hit.article_id.clone()).or_insert(normalized);
    }
    similarity
}

/// Drop articles whose fingerprint already appeared earlier in the list.
/// Articles without a fingerprint are always kept.
fn dedup_by_fingerprint(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| a.content_fingerprint.is_empty() || seen.insert(a.content_fingerprint.clone()))
        .collect()
}

/// Orchestrates retrieval, fusion, hydration and recency ranking.
pub struct HybridSearchEngine {
    dense: DenseRetriever,
    sparse: SparseRetriever,
    hydrator: ResultHydrator,
    fusion: RrfFusion,
    tokenizer: Tokenizer,
    config: SearchConfig,
    events: Option<EventBus>,
    cache: Option<SearchCache>,
}

impl HybridSearchEngine {
    /// Create an engine from prepared retrievers.
    ///
    /// Fails with a configuration error if `config` does not validate. A
    /// cache is created when `config.cache` is set.
    pub fn new(
        dense: DenseRetriever,
        sparse: SparseRetriever,
        hydrator: ResultHydrator,
        config: SearchConfig,
    ) -> NewsrankResult<Self> {
        config
            .validate()
            .map_err(|e| NewsrankError::Configuration(e.to_string()))?;

        Ok(Self {
            dense,
            sparse,
            hydrator,
            fusion: RrfFusion::new(config.rrf_k),
            tokenizer: Tokenizer::new(config.tokenizer.clone()),
            cache: config.cache.as_ref().map(SearchCache::new),
            events: None,
            config,
        })
    }

    /// Create an engine straight from its collaborators.
    pub fn from_providers(
        embedder: Arc<dyn Embedder>,
        dense_index: Arc<dyn DenseIndex>,
        corpus: Arc<dyn CorpusStore>,
        sparse_index: Arc<dyn SparseIndex>,
        articles: Arc<dyn ArticleStore>,
        config: SearchConfig,
    ) -> NewsrankResult<Self> {
        let dense = DenseRetriever::new(embedder, dense_index);
        let sparse = SparseRetriever::new(
            Tokenizer::new(config.tokenizer.clone()),
            &config.bm25,
            corpus,
            sparse_index,
        );
        let hydrator = ResultHydrator::new(articles, config.date_windows_days.clone());
        Self::new(dense, sparse, hydrator, config)
    }

    /// Publish search events on `bus`.
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Use `cache`, replacing any cache built from the config.
    pub fn with_cache(mut self, cache: SearchCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }

    /// Resolve a requested limit: the default when absent, clamped to
    /// `max_limit`, and an error for zero.
    pub fn resolve_limit(&self, requested: Option<usize>) -> NewsrankResult<usize> {
        match requested {
            None => Ok(self.config.default_limit),
            Some(0) => Err(NewsrankError::invalid_limit(0, self.config.max_limit)),
            Some(limit) => Ok(limit.min(self.config.max_limit)),
        }
    }

    /// Run a search, measuring article age from the current time.
    pub async fn search(&self, request: &SearchRequest) -> NewsrankResult<SearchOutcome> {
        self.search_at(request, Utc::now()).await
    }

    /// Run a search that aborts with [`NewsrankError::Cancelled`] as soon
    /// as `cancel` fires. In-flight retriever and store calls are dropped
    /// and nothing is cached.
    pub async fn search_with_cancel(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> NewsrankResult<SearchOutcome> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(query = %request.query, "Search cancelled");
                Err(NewsrankError::Cancelled)
            }
            result = self.search(request) => result,
        }
    }

    /// Run a search with `now` as the single reference instant for both
    /// the hydration windows and recency scoring.
    pub async fn search_at(
        &self,
        request: &SearchRequest,
        now: DateTime<Utc>,
    ) -> NewsrankResult<SearchOutcome> {
        let started = Instant::now();
        let limit = self.resolve_limit(request.limit)?;
        let query = normalize_query(&request.query);
        let query = query.as_str();
        if self.tokenizer.tokenize(query).is_empty() {
            debug!(query, "Query has no searchable terms");
            return Ok(SearchOutcome::empty(request.mode));
        }

        if let Some(cache) = &self.cache {
            if let Some(outcome) = cache.get(query, limit, request.mode).await {
                debug!(query, limit, mode = %request.mode, "Search served from cache");
                let search_id = Uuid::new_v4().to_string();
                self.emit_completed(&search_id, query, request.mode, &outcome, true, started);
                return Ok(outcome);
            }
        }

        let search_id = Uuid::new_v4().to_string();
        let top_k = self.config.candidate_count(limit);

        let candidates = match request.mode {
            SearchMode::Dense => Candidates::from_dense(self.dense.search(query, top_k).await?),
            SearchMode::Sparse => Candidates::from_sparse(self.sparse.search(query, top_k).await?),
            SearchMode::Hybrid => self.retrieve_hybrid(&search_id, query, top_k).await?,
        };

        let hydrated = self.hydrator.hydrate(&candidates.ids, limit, now).await;
        let hydrated_count = hydrated.len();
        let articles = if self.config.dedup_by_fingerprint {
            dedup_by_fingerprint(hydrated)
        } else {
            hydrated
        };

        let scorer = RecencyScorer::new(&self.config.recency, now);
        let mut ranked = scorer.rank(articles, |a| candidates.similarity_of(&a.id));
        ranked.truncate(limit);

        debug!(
            search_id = %search_id,
            method = %candidates.method,
            candidates = candidates.ids.len(),
            hydrated = hydrated_count,
            returned = ranked.len(),
            "Search complete"
        );

        let outcome = SearchOutcome {
            articles: ranked,
            method: candidates.method,
        };

        if let Some(cache) = &self.cache {
            cache
                .insert(query, limit, request.mode, outcome.clone())
                .await;
        }
        self.emit_completed(&search_id, query, request.mode, &outcome, false, started);

        Ok(outcome)
    }

    /// Run both retrievers concurrently and fuse, falling back to
    /// whichever succeeded when one fails.
    async fn retrieve_hybrid(
        &self,
        search_id: &str,
        query: &str,
        top_k: usize,
    ) -> NewsrankResult<Candidates> {
        let (dense, sparse) = tokio::join!(
            self.dense.search(query, top_k),
            self.sparse.search(query, top_k)
        );

        match (dense, sparse) {
            (Ok(dense), Ok(sparse)) => {
                let fused = self.fusion.fuse(&dense, &sparse);
                debug!(
                    dense = dense.len(),
                    sparse = sparse.len(),
                    fused = fused.len(),
                    "Fused hybrid results"
                );
                Ok(Candidates::from_fused(fused, &dense, &sparse))
            }
            (Ok(dense), Err(e)) => {
                self.report_degraded(search_id, SearchMode::Sparse, SearchMode::Dense, &e);
                Ok(Candidates::from_dense(dense))
            }
            (Err(e), Ok(sparse)) => {
                self.report_degraded(search_id, SearchMode::Dense, SearchMode::Sparse, &e);
                Ok(Candidates::from_sparse(sparse))
            }
            (Err(dense), Err(sparse)) => {
                warn!(
                    search_id,
                    dense_error = %dense,
                    sparse_error = %sparse,
                    "Both retrievers failed"
                );
                Err(NewsrankError::AllRetrieversFailed {
                    dense: dense.to_string(),
                    sparse: sparse.to_string(),
                })
            }
        }
    }

    fn report_degraded(
        &self,
        search_id: &str,
        failed: SearchMode,
        fallback: SearchMode,
        error: &NewsrankError,
    ) {
        warn!(search_id, %failed, %fallback, error = %error, "Retriever failed; using single-method results");
        if let Some(bus) = &self.events {
            bus.emit(SearchEvent::Degraded(SearchDegradedEvent::new(
                search_id,
                failed,
                fallback,
                error.to_string(),
            )));
        }
    }

    fn emit_completed(
        &self,
        search_id: &str,
        query: &str,
        requested: SearchMode,
        outcome: &SearchOutcome,
        cached: bool,
        started: Instant,
    ) {
        if let Some(bus) = &self.events {
            let event = SearchCompletedEvent::new(
                search_id,
                query,
                requested,
                outcome.method,
                outcome.len(),
            )
            .with_cached(cached)
            .with_duration_ms(started.elapsed().as_millis() as u64);
            bus.emit(SearchEvent::Completed(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::CacheConfig;
    use crate::traits::{CorpusStats, IndexMatch, TermStats};
    use crate::types::SparseVector;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    struct FakeEmbedder {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, _text: &str) -> NewsrankResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NewsrankError::embedding("embedding provider down"))
            } else {
                Ok(vec![0.1, 0.2, 0.3])
            }
        }

        fn dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "fake"
        }
    }

    /// Canned index answering both dense and sparse queries.
    struct FakeIndex {
        matches: Option<Vec<IndexMatch>>,
        delay: Option<std::time::Duration>,
        calls: AtomicUsize,
        last_top_k: AtomicUsize,
    }

    impl FakeIndex {
        fn returning(matches: &[(&str, f32)]) -> Self {
            Self {
                matches: Some(matches.iter().map(|(id, s)| IndexMatch::new(*id, *s)).collect()),
                delay: None,
                calls: AtomicUsize::new(0),
                last_top_k: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                matches: None,
                delay: None,
                calls: AtomicUsize::new(0),
                last_top_k: AtomicUsize::new(0),
            }
        }

        fn slow(mut self) -> Self {
            self.delay = Some(std::time::Duration::from_secs(30));
            self
        }

        async fn answer(&self, top_k: usize) -> NewsrankResult<Vec<IndexMatch>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_top_k.store(top_k, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.matches
                .clone()
                .ok_or_else(|| NewsrankError::vector_index("index unreachable"))
        }
    }

    #[async_trait]
    impl DenseIndex for FakeIndex {
        async fn query(&self, _vector: &[f32], top_k: usize) -> NewsrankResult<Vec<IndexMatch>> {
            self.answer(top_k).await
        }
    }

    #[async_trait]
    impl SparseIndex for FakeIndex {
        async fn query(
            &self,
            _vector: &SparseVector,
            top_k: usize,
        ) -> NewsrankResult<Vec<IndexMatch>> {
            self.answer(top_k).await
        }
    }

    struct FakeCorpus;

    #[async_trait]
    impl CorpusStore for FakeCorpus {
        async fn lookup_terms(&self, terms: &[String]) -> NewsrankResult<Vec<TermStats>> {
            Ok(terms
                .iter()
                .enumerate()
                .map(|(i, term)| TermStats {
                    term: term.clone(),
                    term_id: i as u32 + 1,
                    doc_freq: 10,
                })
                .collect())
        }

        async fn stats(&self) -> NewsrankResult<CorpusStats> {
            Ok(CorpusStats {
                total_docs: 1000,
                ..Default::default()
            })
        }
    }

    struct MemoryStore {
        articles: Vec<Article>,
        calls: Mutex<usize>,
    }

    impl MemoryStore {
        fn new(articles: Vec<Article>) -> Self {
            Self {
                articles,
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ArticleStore for MemoryStore {
        async fn find_by_ids_in_range(
            &self,
            ids: &[String],
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> NewsrankResult<Vec<Article>> {
            *self.calls.lock().unwrap() += 1;
            Ok(self
                .articles
                .iter()
                .filter(|a| ids.contains(&a.id))
                .filter(|a| a.published_at >= start && a.published_at <= end)
                .cloned()
                .collect())
        }
    }

    fn article(id: &str, age_days: i64) -> Article {
        Article::new(id, now() - Duration::days(age_days), format!("Title {}", id), "body")
    }

    struct Fixture {
        embedder: Arc<FakeEmbedder>,
        dense: Arc<FakeIndex>,
        sparse: Arc<FakeIndex>,
        store: Arc<MemoryStore>,
    }

    impl Fixture {
        fn new(dense: FakeIndex, sparse: FakeIndex, articles: Vec<Article>) -> Self {
            Self {
                embedder: Arc::new(FakeEmbedder {
                    fail: false,
                    calls: AtomicUsize::new(0),
                }),
                dense: Arc::new(dense),
                sparse: Arc::new(sparse),
                store: Arc::new(MemoryStore::new(articles)),
            }
        }

        fn engine(&self, config: SearchConfig) -> HybridSearchEngine {
            HybridSearchEngine::from_providers(
                self.embedder.clone(),
                self.dense.clone(),
                Arc::new(FakeCorpus),
                self.sparse.clone(),
                self.store.clone(),
                config,
            )
            .unwrap()
        }
    }

    fn ids(outcome: &SearchOutcome) -> Vec<&str> {
        outcome.articles.iter().map(|a| a.article.id.as_str()).collect()
    }

    fn abcd() -> Vec<Article> {
        vec![article("A", 1), article("B", 1), article("C", 1), article("D", 1)]
    }

    #[tokio::test]
    async fn test_hybrid_fuses_and_rescored_by_similarity() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 0.9), ("B", 0.8), ("C", 0.5)]),
            FakeIndex::returning(&[("B", 10.0), ("D", 6.0), ("A", 3.0)]),
            abcd(),
        );
        let engine = fixture.engine(SearchConfig::default());

        let outcome = engine
            .search_at(&SearchRequest::new("central bank rates"), now())
            .await
            .unwrap();

        assert_eq!(outcome.method, SearchMode::Hybrid);
        assert_eq!(ids(&outcome), vec!["A", "B", "D", "C"]);
        assert!(outcome.articles[0].display_score > outcome.articles[1].display_score);
    }

    #[tokio::test]
    async fn test_hybrid_falls_back_when_dense_fails() {
        let fixture = Fixture::new(
            FakeIndex::failing(),
            FakeIndex::returning(&[("B", 10.0), ("D", 6.0)]),
            abcd(),
        );
        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let engine = fixture.engine(SearchConfig::default()).with_event_bus(bus);

        let outcome = engine
            .search_at(&SearchRequest::new("rates"), now())
            .await
            .unwrap();

        assert_eq!(outcome.method, SearchMode::Sparse);
        assert_eq!(ids(&outcome), vec!["B", "D"]);

        match events.recv().await.unwrap() {
            SearchEvent::Degraded(e) => {
                assert_eq!(e.failed, SearchMode::Dense);
                assert_eq!(e.fallback, SearchMode::Sparse);
            }
            other => panic!("expected degraded event, got {:?}", other),
        }
        match events.recv().await.unwrap() {
            SearchEvent::Completed(e) => {
                assert_eq!(e.requested, SearchMode::Hybrid);
                assert_eq!(e.method, SearchMode::Sparse);
                assert_eq!(e.count, 2);
                assert!(!e.cached);
            }
            other => panic!("expected completed event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hybrid_falls_back_when_sparse_fails() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("C", 0.7)]),
            FakeIndex::failing(),
            abcd(),
        );
        let outcome = fixture
            .engine(SearchConfig::default())
            .search_at(&SearchRequest::new("rates"), now())
            .await
            .unwrap();

        assert_eq!(outcome.method, SearchMode::Dense);
        assert_eq!(ids(&outcome), vec!["C"]);
    }

    #[tokio::test]
    async fn test_both_retrievers_failing_is_an_error() {
        let fixture = Fixture::new(FakeIndex::failing(), FakeIndex::failing(), abcd());
        let err = fixture
            .engine(SearchConfig::default())
            .search_at(&SearchRequest::new("rates"), now())
            .await
            .unwrap_err();

        assert!(matches!(err, NewsrankError::AllRetrieversFailed { .. }));
        assert_eq!(*fixture.store.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_single_mode_failure_propagates() {
        let fixture = Fixture::new(
            FakeIndex::failing(),
            FakeIndex::returning(&[("A", 1.0)]),
            abcd(),
        );
        let err = fixture
            .engine(SearchConfig::default())
            .search_at(
                &SearchRequest::new("rates").with_mode(SearchMode::Dense),
                now(),
            )
            .await
            .unwrap_err();

        assert!(err.is_provider_failure());
        assert_eq!(fixture.sparse.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sparse_mode_uses_only_sparse_index() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 1.0)]),
            FakeIndex::returning(&[("D", 4.0), ("B", 2.0)]),
            abcd(),
        );
        let outcome = fixture
            .engine(SearchConfig::default())
            .search_at(
                &SearchRequest::new("rates").with_mode(SearchMode::Sparse),
                now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.method, SearchMode::Sparse);
        assert_eq!(ids(&outcome), vec!["D", "B"]);
        assert_eq!(fixture.dense.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_query_touches_nothing() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 1.0)]),
            FakeIndex::returning(&[("A", 1.0)]),
            abcd(),
        );
        let outcome = fixture
            .engine(SearchConfig::default())
            .search_at(&SearchRequest::new("   "), now())
            .await
            .unwrap();

        assert!(outcome.is_empty());
        assert_eq!(outcome.method, SearchMode::Hybrid);
        assert_eq!(fixture.embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.dense.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.sparse.calls.load(Ordering::SeqCst), 0);
        assert_eq!(*fixture.store.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_without_terms_touches_nothing() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 1.0)]),
            FakeIndex::returning(&[("A", 1.0)]),
            abcd(),
        );
        let engine = fixture.engine(SearchConfig::default());

        for query in ["?!", "the of and"] {
            for mode in [SearchMode::Hybrid, SearchMode::Dense, SearchMode::Sparse] {
                let outcome = engine
                    .search_at(&SearchRequest::new(query).with_mode(mode), now())
                    .await
                    .unwrap();
                assert!(outcome.is_empty());
                assert_eq!(outcome.method, mode);
            }
        }

        assert_eq!(fixture.embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.dense.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.sparse.calls.load(Ordering::SeqCst), 0);
        assert_eq!(*fixture.store.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_limit_validation_and_oversampling() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 1.0)]),
            FakeIndex::returning(&[]),
            abcd(),
        );
        let engine = fixture.engine(SearchConfig::default());

        let err = engine
            .search_at(&SearchRequest::new("rates").with_limit(0), now())
            .await
            .unwrap_err();
        assert!(matches!(err, NewsrankError::Validation { .. }));

        engine
            .search_at(
                &SearchRequest::new("rates").with_limit(3).with_mode(SearchMode::Dense),
                now(),
            )
            .await
            .unwrap();
        assert_eq!(fixture.dense.last_top_k.load(Ordering::SeqCst), 50);

        engine
            .search_at(
                &SearchRequest::new("rates").with_limit(5000).with_mode(SearchMode::Dense),
                now(),
            )
            .await
            .unwrap();
        assert_eq!(fixture.dense.last_top_k.load(Ordering::SeqCst), 500);
    }

    #[tokio::test]
    async fn test_truncates_to_limit() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 0.9), ("B", 0.8), ("C", 0.7), ("D", 0.6)]),
            FakeIndex::returning(&[]),
            abcd(),
        );
        let outcome = fixture
            .engine(SearchConfig::default())
            .search_at(
                &SearchRequest::new("rates").with_limit(2).with_mode(SearchMode::Dense),
                now(),
            )
            .await
            .unwrap();
        assert_eq!(ids(&outcome), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_newer_article_wins_at_equal_similarity() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("old", 0.8), ("new", 0.8)]),
            FakeIndex::returning(&[]),
            vec![article("old", 20), article("new", 1)],
        );
        let outcome = fixture
            .engine(SearchConfig::default())
            .search_at(&SearchRequest::new("rates").with_mode(SearchMode::Dense), now())
            .await
            .unwrap();
        assert_eq!(ids(&outcome), vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_articles_outside_widest_window_dropped() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("stale", 0.99), ("fresh", 0.5)]),
            FakeIndex::returning(&[]),
            vec![article("stale", 45), article("fresh", 1)],
        );
        let outcome = fixture
            .engine(SearchConfig::default())
            .search_at(&SearchRequest::new("rates").with_mode(SearchMode::Dense), now())
            .await
            .unwrap();
        assert_eq!(ids(&outcome), vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_fingerprint_duplicates_removed() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 0.9), ("B", 0.8), ("C", 0.7)]),
            FakeIndex::returning(&[]),
            vec![
                article("A", 1).with_fingerprint("story-1"),
                article("B", 1).with_fingerprint("story-1"),
                article("C", 1),
            ],
        );
        let request = SearchRequest::new("rates").with_mode(SearchMode::Dense);

        let outcome = fixture
            .engine(SearchConfig::default())
            .search_at(&request, now())
            .await
            .unwrap();
        assert_eq!(ids(&outcome), vec!["A", "C"]);

        let keep_all = SearchConfig {
            dedup_by_fingerprint: false,
            ..Default::default()
        };
        let outcome = fixture.engine(keep_all).search_at(&request, now()).await.unwrap();
        assert_eq!(outcome.len(), 3);
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_queries() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 0.9)]),
            FakeIndex::returning(&[("A", 2.0)]),
            abcd(),
        );
        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let config = SearchConfig::default().with_cache(CacheConfig::default());
        let engine = fixture.engine(config).with_event_bus(bus);

        let first = engine.search_at(&SearchRequest::new("Rates"), now()).await.unwrap();
        let second = engine.search_at(&SearchRequest::new(" Rates "), now()).await.unwrap();

        assert_eq!(ids(&first), ids(&second));
        assert_eq!(fixture.dense.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fixture.sparse.calls.load(Ordering::SeqCst), 1);

        let _first_event = events.recv().await.unwrap();
        match events.recv().await.unwrap() {
            SearchEvent::Completed(e) => assert!(e.cached),
            other => panic!("expected completed event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cache_key_keeps_case() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 0.9)]),
            FakeIndex::returning(&[("A", 2.0)]),
            abcd(),
        );
        let config = SearchConfig::default().with_cache(CacheConfig::default());
        let engine = fixture.engine(config);

        engine.search_at(&SearchRequest::new("US rates"), now()).await.unwrap();
        engine.search_at(&SearchRequest::new("us rates"), now()).await.unwrap();

        assert_eq!(fixture.embedder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fixture.dense.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_search_not_cached() {
        let fixture = Fixture::new(FakeIndex::failing(), FakeIndex::failing(), abcd());
        let config = SearchConfig::default().with_cache(CacheConfig::default());
        let engine = fixture.engine(config);

        assert!(engine.search_at(&SearchRequest::new("rates"), now()).await.is_err());
        assert!(engine.search_at(&SearchRequest::new("rates"), now()).await.is_err());
        assert_eq!(fixture.dense.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_without_calls() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 0.9)]),
            FakeIndex::returning(&[]),
            abcd(),
        );
        let engine = fixture.engine(SearchConfig::default());
        let token = CancellationToken::new();
        token.cancel();

        let err = engine
            .search_with_cancel(&SearchRequest::new("rates"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, NewsrankError::Cancelled));
        assert_eq!(fixture.embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_slow_retrieval() {
        let fixture = Fixture::new(
            FakeIndex::returning(&[("A", 0.9)]).slow(),
            FakeIndex::returning(&[("A", 1.0)]).slow(),
            abcd(),
        );
        let config = SearchConfig::default().with_cache(CacheConfig::default());
        let engine = fixture.engine(config);
        let token = CancellationToken::new();

        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let err = engine
            .search_with_cancel(&SearchRequest::new("rates"), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, NewsrankError::Cancelled));
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(*fixture.store.calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let fixture = Fixture::new(FakeIndex::failing(), FakeIndex::failing(), vec![]);
        let config = SearchConfig::default().with_date_windows(vec![]);
        let result = HybridSearchEngine::from_providers(
            fixture.embedder.clone(),
            fixture.dense.clone(),
            Arc::new(FakeCorpus),
            fixture.sparse.clone(),
            fixture.store.clone(),
            config,
        );
        assert!(matches!(result, Err(NewsrankError::Configuration(_))));
    }
}
