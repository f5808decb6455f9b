//! Query tokenizer for BM25 lookups.
//!
//! Lowercases, splits on any non-alphanumeric character (which strips
//! punctuation), and optionally drops English stop words. Output order
//! follows the input text, so tokenization is deterministic.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
        "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has",
        "have", "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "me",
        "my", "no", "not", "of", "on", "or", "our", "she", "so", "such", "than", "that", "the",
        "their", "them", "then", "there", "these", "they", "this", "those", "to", "up", "us",
        "was", "we", "were", "what", "when", "where", "which", "who", "why", "will", "with",
        "would", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Tokenizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Drop common English stop words.
    pub remove_stop_words: bool,
    /// Minimum token length in characters.
    pub min_token_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            remove_stop_words: true,
            min_token_len: 1,
        }
    }
}

/// Normalizes free text into lexical terms.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a tokenizer with the given settings.
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// Split `text` into normalized terms.
    ///
    /// Empty or whitespace-only input yields no tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| self.keep(token))
            .map(str::to_string)
            .collect()
    }

    fn keep(&self, token: &str) -> bool {
        if token.is_empty() || token.chars().count() < self.config.min_token_len {
            return false;
        }
        !(self.config.remove_stop_words && STOP_WORDS.contains(token))
    }
}
