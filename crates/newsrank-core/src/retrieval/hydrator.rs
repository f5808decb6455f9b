//! Result hydration with adaptive date-window widening.
//!
//! The article store holds far more than is relevant today, so ids are
//! resolved inside successively wider windows ending at "now" until one
//! yields enough records. Output always follows the incoming id order,
//! which is how the retrieval ranking survives hydration.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::traits::ArticleStore;
use crate::types::Article;

/// Default window sizes, in days back from now.
pub const DEFAULT_DATE_WINDOWS: [u32; 5] = [2, 3, 7, 14, 30];

/// Widest window accepted by config validation (about a century).
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Resolves ranked ids to articles.
#[derive(Clone)]
pub struct ResultHydrator {
    store: Arc<dyn ArticleStore>,
    windows_days: Vec<u32>,
}

impl ResultHydrator {
    /// Create a hydrator over `windows_days`, narrowest first.
    pub fn new(store: Arc<dyn ArticleStore>, windows_days: Vec<u32>) -> Self {
        Self {
            store,
            windows_days,
        }
    }

    /// The configured windows, narrowest first.
    pub fn windows(&self) -> &[u32] {
        &self.windows_days
    }

    /// Resolve `ordered_ids` into articles, preserving their order.
    ///
    /// Stops at the first window returning at least `target_count`
    /// records. Otherwise returns the widest window that could be queried,
    /// which may hold fewer than `target_count` records. A failing window,
    /// or one reaching past the representable date range, is logged and
    /// skipped.
    pub async fn hydrate(
        &self,
        ordered_ids: &[String],
        target_count: usize,
        now: DateTime<Utc>,
    ) -> Vec<Article> {
        if ordered_ids.is_empty() {
            return Vec::new();
        }

        let mut best = Vec::new();
        for &days in &self.windows_days {
            let Some(start) = now.checked_sub_signed(Duration::days(days as i64)) else {
                warn!(window_days = days, "Window start out of range; skipping");
                continue;
            };
            match self.store.find_by_ids_in_range(ordered_ids, start, now).await {
                Ok(records) => {
                    let ordered = reorder(ordered_ids, records);
                    debug!(
                        window_days = days,
                        found = ordered.len(),
                        target = target_count,
                        "Hydration window queried"
                    );
                    if ordered.len() >= target_count {
                        return ordered;
                    }
                    best = ordered;
                }
                Err(e) => {
                    warn!(window_days = days, error = %e, "Article lookup failed; widening window");
                }
            }
        }
        best
    }
}

/// Re-emit `records` in `ordered_ids` order, dropping ids with no record.
fn reorder(ordered_ids: &[String], records: Vec<Article>) -> Vec<Article> {
    let mut by_id: HashMap<String, Article> = records
        .into_iter()
        .map(|article| (article.id.clone(), article))
        .collect();

    ordered_ids
        .iter()
        .filter_map(|id| by_id.remove(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NewsrankError, NewsrankResult};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("id{}", i)).collect()
    }

    /// Answers each window with a canned id list, or an error.
    struct WindowedStore {
        answers: HashMap<i64, Option<Vec<String>>>,
        calls: Mutex<Vec<i64>>,
    }

    impl WindowedStore {
        fn new(answers: Vec<(i64, Option<Vec<String>>)>) -> Self {
            Self {
                answers: answers.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<i64> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArticleStore for WindowedStore {
        async fn find_by_ids_in_range(
            &self,
            requested: &[String],
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> NewsrankResult<Vec<Article>> {
            let days = (end - start).num_days();
            self.calls.lock().unwrap().push(days);
            match self.answers.get(&days).cloned().flatten() {
                Some(found) => Ok(found
                    .into_iter()
                    .rev()
                    .filter(|id| requested.contains(id))
                    .map(|id| Article::new(id, end, "title", "body"))
                    .collect()),
                None => Err(NewsrankError::database("window query failed")),
            }
        }
    }

    fn pick(all: &[String], idx: &[usize]) -> Vec<String> {
        idx.iter().map(|&i| all[i].clone()).collect()
    }

    #[tokio::test]
    async fn test_stops_at_first_window_meeting_target() {
        let all = ids(10);
        let store = Arc::new(WindowedStore::new(vec![
            (2, Some(pick(&all, &[1, 4, 7]))),
            (3, Some(pick(&all, &[0, 1, 4, 7, 9]))),
            (7, Some(pick(&all, &[0, 1, 2, 4, 5, 7, 8, 9]))),
            (14, Some(all.clone())),
        ]));
        let hydrator = ResultHydrator::new(store.clone(), vec![2, 3, 7]);

        let articles = hydrator.hydrate(&all, 6, now()).await;

        let got: Vec<_> = articles.iter().map(|a| a.id.clone()).collect();
        assert_eq!(got, pick(&all, &[0, 1, 2, 4, 5, 7, 8, 9]));
        assert_eq!(store.calls(), vec![2, 3, 7]);
    }

    #[tokio::test]
    async fn test_first_window_sufficient() {
        let all = ids(4);
        let store = Arc::new(WindowedStore::new(vec![(2, Some(all.clone()))]));
        let hydrator = ResultHydrator::new(store.clone(), DEFAULT_DATE_WINDOWS.to_vec());

        let articles = hydrator.hydrate(&all, 3, now()).await;
        assert_eq!(articles.len(), 4);
        assert_eq!(store.calls(), vec![2]);
    }

    #[tokio::test]
    async fn test_widest_window_returned_when_target_unmet() {
        let all = ids(10);
        let store = Arc::new(WindowedStore::new(vec![
            (2, Some(vec![])),
            (3, Some(pick(&all, &[3]))),
            (7, Some(pick(&all, &[3, 6]))),
        ]));
        let hydrator = ResultHydrator::new(store.clone(), vec![2, 3, 7]);

        let articles = hydrator.hydrate(&all, 5, now()).await;
        let got: Vec<_> = articles.iter().map(|a| a.id.clone()).collect();
        assert_eq!(got, pick(&all, &[3, 6]));
        assert_eq!(store.calls(), vec![2, 3, 7]);
    }

    #[tokio::test]
    async fn test_failed_window_advances() {
        let all = ids(5);
        let store = Arc::new(WindowedStore::new(vec![
            (2, None),
            (3, Some(all.clone())),
        ]));
        let hydrator = ResultHydrator::new(store.clone(), vec![2, 3, 7]);

        let articles = hydrator.hydrate(&all, 5, now()).await;
        assert_eq!(articles.len(), 5);
        assert_eq!(store.calls(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_failed_widest_window_keeps_last_success() {
        let all = ids(5);
        let store = Arc::new(WindowedStore::new(vec![
            (2, Some(pick(&all, &[2]))),
            (3, None),
        ]));
        let hydrator = ResultHydrator::new(store, vec![2, 3]);

        let articles = hydrator.hydrate(&all, 4, now()).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, "id2");
    }

    #[tokio::test]
    async fn test_out_of_range_window_is_skipped() {
        let all = ids(3);
        let store = Arc::new(WindowedStore::new(vec![(2, Some(pick(&all, &[0])))]));
        let hydrator = ResultHydrator::new(store.clone(), vec![2, 100_000_000]);

        let articles = hydrator.hydrate(&all, 5, now()).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, "id0");
        assert_eq!(store.calls(), vec![2]);
    }

    #[tokio::test]
    async fn test_empty_ids_skip_store() {
        let store = Arc::new(WindowedStore::new(vec![]));
        let hydrator = ResultHydrator::new(store.clone(), vec![2, 3]);
        assert!(hydrator.hydrate(&[], 5, now()).await.is_empty());
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_reorder_is_subsequence_of_input() {
        let order = vec!["c".to_string(), "a".to_string(), "x".to_string(), "b".to_string()];
        let records = vec![
            Article::new("b", now(), "t", "b"),
            Article::new("a", now(), "t", "b"),
            Article::new("c", now(), "t", "b"),
            Article::new("stray", now(), "t", "b"),
        ];
        let out: Vec<_> = reorder(&order, records).into_iter().map(|a| a.id).collect();
        assert_eq!(out, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_reorder_emits_repeated_ids_once() {
        let order = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let records = vec![Article::new("a", now(), "t", "b"), Article::new("b", now(), "t", "b")];
        let out: Vec<_> = reorder(&order, records).into_iter().map(|a| a.id).collect();
        assert_eq!(out, vec!["a", "b"]);
    }
}
