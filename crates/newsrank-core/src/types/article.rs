//! Article types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source cited by an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Publisher or outlet name.
    pub source_name: String,
    /// Title of the cited piece.
    pub article_title: String,
    /// Link to the cited piece.
    pub url: String,
}

impl Citation {
    /// Create a new citation.
    pub fn new(
        source_name: impl Into<String>,
        article_title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            article_title: article_title.into(),
            url: url.into(),
        }
    }

    fn same_source(&self, other: &Citation) -> bool {
        self.source_name == other.source_name && self.article_title == other.article_title
    }
}

/// A hydrated news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Stable identifier shared with the vector indexes.
    pub id: String,
    /// Publication timestamp.
    pub published_at: DateTime<Utc>,
    /// Headline.
    pub title: String,
    /// Article text.
    pub body: String,
    /// Dedup key; articles with equal fingerprints carry the same story.
    pub content_fingerprint: String,
    /// Categorical label such as cluster membership.
    pub tag: String,
    /// Cited sources, unique by (source name, article title).
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl Article {
    /// Create a new article without citations.
    pub fn new(
        id: impl Into<String>,
        published_at: DateTime<Utc>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            published_at,
            title: title.into(),
            body: body.into(),
            content_fingerprint: String::new(),
            tag: String::new(),
            citations: Vec::new(),
        }
    }

    /// Set the content fingerprint.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.content_fingerprint = fingerprint.into();
        self
    }

    /// Set the tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the citations, dropping duplicates.
    pub fn with_citations(mut self, citations: impl IntoIterator<Item = Citation>) -> Self {
        self.citations.clear();
        for citation in citations {
            self.push_citation(citation);
        }
        self
    }

    /// Append a citation unless one with the same source and title exists.
    ///
    /// Returns `true` if the citation was added.
    pub fn push_citation(&mut self, citation: Citation) -> bool {
        if self.citations.iter().any(|c| c.same_source(&citation)) {
            return false;
        }
        self.citations.push(citation);
        true
    }
}
