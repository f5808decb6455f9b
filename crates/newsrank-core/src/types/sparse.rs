//! Sparse vector representation for lexical search.

use serde::Serialize;

/// A sparse weight vector over corpus term ids.
///
/// `term_indices` and `weights` are parallel; indices are unique and every
/// weight is strictly positive. Only [`SparseVector::push`] grows the vector,
/// which enforces both.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SparseVector {
    term_indices: Vec<u32>,
    weights: Vec<f32>,
}

impl SparseVector {
    /// Create an empty sparse vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty sparse vector with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            term_indices: Vec::with_capacity(capacity),
            weights: Vec::with_capacity(capacity),
        }
    }

    /// Append an entry.
    ///
    /// Non-positive or non-finite weights and repeated indices are rejected;
    /// returns `true` if the entry was stored.
    pub fn push(&mut self, term_index: u32, weight: f32) -> bool {
        if !(weight.is_finite() && weight > 0.0) || self.term_indices.contains(&term_index) {
            return false;
        }
        self.term_indices.push(term_index);
        self.weights.push(weight);
        true
    }

    /// Term ids, in insertion order.
    pub fn term_indices(&self) -> &[u32] {
        &self.term_indices
    }

    /// Weights, parallel to [`SparseVector::term_indices`].
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Iterate over `(term_index, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.term_indices
            .iter()
            .copied()
            .zip(self.weights.iter().copied())
    }

    /// Weight stored for a term id, if present.
    pub fn weight_of(&self, term_index: u32) -> Option<f32> {
        self.iter()
            .find(|(idx, _)| *idx == term_index)
            .map(|(_, w)| w)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.term_indices.len()
    }

    /// Whether the vector has no entries.
    pub fn is_empty(&self) -> bool {
        self.term_indices.is_empty()
    }
}
