//! Reciprocal Rank Fusion for combining ranked lists.
//!
//! RRF only looks at ranks, so dense cosine similarities and BM25 scores
//! can be merged without normalizing them onto a common scale.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::types::{FusedHit, RankedHit};

/// Standard RRF constant from Cormack, Clarke & Buettcher (2009).
pub const DEFAULT_RRF_K: f32 = 60.0;

/// Reciprocal Rank Fusion.
///
/// Formula: score(d) = sum(1 / (k + rank_i(d))) over every list i that
/// contains d. Larger `k` flattens the difference between ranks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RrfFusion {
    pub k: f32,
}

impl Default for RrfFusion {
    fn default() -> Self {
        Self { k: DEFAULT_RRF_K }
    }
}

struct Accumulator {
    score: f32,
    best_rank: usize,
}

impl RrfFusion {
    /// Create RRF fusion with a custom k value.
    pub fn new(k: f32) -> Self {
        Self { k }
    }

    /// Fuse two ranked lists.
    pub fn fuse(&self, list_a: &[RankedHit], list_b: &[RankedHit]) -> Vec<FusedHit> {
        self.fuse_many(&[list_a, list_b])
    }

    /// Fuse any number of ranked lists.
    ///
    /// Output is sorted by descending fused score, then by best rank in any
    /// list, then by id, so identical inputs always give identical output.
    /// An id repeated within one list only counts its best rank there.
    pub fn fuse_many(&self, lists: &[&[RankedHit]]) -> Vec<FusedHit> {
        let mut scores: HashMap<&str, Accumulator> = HashMap::new();

        for list in lists {
            let mut best_in_list: HashMap<&str, usize> = HashMap::new();
            for hit in list.iter() {
                let rank = best_in_list.entry(hit.article_id.as_str()).or_insert(hit.rank);
                *rank = (*rank).min(hit.rank);
            }

            let mut seen: HashSet<&str> = HashSet::new();
            for hit in list.iter() {
                let id = hit.article_id.as_str();
                if !seen.insert(id) {
                    continue;
                }
                let rank = best_in_list[id];
                let acc = scores.entry(id).or_insert(Accumulator {
                    score: 0.0,
                    best_rank: rank,
                });
                acc.score += 1.0 / (self.k + rank as f32);
                acc.best_rank = acc.best_rank.min(rank);
            }
        }

        let mut fused: Vec<FusedHit> = scores
            .into_iter()
            .map(|(id, acc)| FusedHit {
                article_id: id.to_string(),
                fused_score: acc.score,
                best_rank: acc.best_rank,
            })
            .collect();

        fused.sort_by(compare_fused);
        fused
    }
}

fn compare_fused(a: &FusedHit, b: &FusedHit) -> Ordering {
    OrderedFloat(b.fused_score)
        .cmp(&OrderedFloat(a.fused_score))
        .then_with(|| a.best_rank.cmp(&b.best_rank))
        .then_with(|| a.article_id.cmp(&b.article_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(ids: &[&str]) -> Vec<RankedHit> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| RankedHit::new(*id, i + 1, 1.0 - i as f32 * 0.1))
            .collect()
    }

    fn score_of(fused: &[FusedHit], id: &str) -> f32 {
        fused.iter().find(|h| h.article_id == id).unwrap().fused_score
    }

    #[test]
    fn test_dense_sparse_scenario() {
        let dense = ranked(&["A", "B", "C"]);
        let sparse = ranked(&["B", "D", "A"]);

        let fused = RrfFusion::default().fuse(&dense, &sparse);
        let order: Vec<_> = fused.iter().map(|h| h.article_id.as_str()).collect();

        assert_eq!(order, vec!["B", "A", "D", "C"]);
        assert!(score_of(&fused, "A") > score_of(&fused, "D"));
    }

    #[test]
    fn test_presence_in_both_lists_strictly_wins() {
        let rrf = RrfFusion::default();
        for rank_a in 1..=20usize {
            for rank_b in 1..=20usize {
                let a = vec![RankedHit::new("x", rank_a, 0.5)];
                let b = vec![RankedHit::new("x", rank_b, 0.5)];
                let both = score_of(&rrf.fuse(&a, &b), "x");
                let only_a = score_of(&rrf.fuse(&a, &[]), "x");
                let only_b = score_of(&rrf.fuse(&[], &b), "x");
                assert!(both > only_a);
                assert!(both > only_b);
            }
        }
    }

    #[test]
    fn test_monotonic_for_any_k() {
        for k in [1.0f32, 10.0, 60.0, 1000.0] {
            let rrf = RrfFusion::new(k);
            let a = ranked(&["shared", "a_only"]);
            let b = ranked(&["b_only", "shared"]);
            let fused = rrf.fuse(&a, &b);
            assert_eq!(fused[0].article_id, "shared");
        }
    }

    #[test]
    fn test_deterministic() {
        let a = ranked(&["a", "b", "c", "d"]);
        let b = ranked(&["d", "c", "e", "f"]);
        let rrf = RrfFusion::default();
        let first = rrf.fuse(&a, &b);
        for _ in 0..10 {
            assert_eq!(rrf.fuse(&a, &b), first);
        }
    }

    #[test]
    fn test_ties_broken_by_best_rank_then_id() {
        // "a" and "b" both sit at rank 1 in one list each.
        let fused = RrfFusion::default().fuse(&ranked(&["b"]), &ranked(&["a"]));
        assert_eq!(fused[0].article_id, "a");
        assert_eq!(fused[1].article_id, "b");
        assert_eq!(fused[0].fused_score, fused[1].fused_score);
    }

    #[test]
    fn test_empty_inputs() {
        let rrf = RrfFusion::default();
        assert!(rrf.fuse(&[], &[]).is_empty());

        let fused = rrf.fuse(&[], &ranked(&["x", "y"]));
        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].article_id, "x");
        assert_eq!(fused[0].best_rank, 1);
    }

    #[test]
    fn test_duplicate_within_list_counts_once() {
        let a = vec![RankedHit::new("x", 1, 1.0), RankedHit::new("x", 3, 0.5)];
        let fused = RrfFusion::default().fuse(&a, &[]);
        assert_eq!(fused.len(), 1);
        assert!((fused[0].fused_score - 1.0 / 61.0).abs() < 1e-6);
    }

    #[test]
    fn test_larger_k_flattens_rank_gap() {
        let list = ranked(&["top", "second"]);
        let gap = |k: f32| {
            let fused = RrfFusion::new(k).fuse(&list, &[]);
            score_of(&fused, "top") / score_of(&fused, "second")
        };
        assert!(gap(1.0) > gap(60.0));
        assert!(gap(60.0) > gap(1000.0));
    }
}
