//! Search event payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::retrieval::SearchMode;

/// Events emitted by the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    /// A search returned results (possibly zero).
    Completed(SearchCompletedEvent),
    /// One retriever failed and hybrid search fell back to the other.
    Degraded(SearchDegradedEvent),
}

impl SearchEvent {
    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Completed(_) => "search.completed",
            Self::Degraded(_) => "search.degraded",
        }
    }

    /// Identifier of the search this event belongs to.
    pub fn search_id(&self) -> &str {
        match self {
            Self::Completed(e) => &e.search_id,
            Self::Degraded(e) => &e.search_id,
        }
    }

    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Completed(e) => e.timestamp,
            Self::Degraded(e) => e.timestamp,
        }
    }
}

/// Payload for [`SearchEvent::Completed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCompletedEvent {
    pub search_id: String,
    pub query: String,
    /// Mode the caller asked for.
    pub requested: SearchMode,
    /// Mode that produced the results.
    pub method: SearchMode,
    pub count: usize,
    pub cached: bool,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl SearchCompletedEvent {
    pub fn new(
        search_id: impl Into<String>,
        query: impl Into<String>,
        requested: SearchMode,
        method: SearchMode,
        count: usize,
    ) -> Self {
        Self {
            search_id: search_id.into(),
            query: query.into(),
            requested,
            method,
            count,
            cached: false,
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// Payload for [`SearchEvent::Degraded`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDegradedEvent {
    pub search_id: String,
    /// Retriever that failed.
    pub failed: SearchMode,
    /// Retriever whose results were used instead.
    pub fallback: SearchMode,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl SearchDegradedEvent {
    pub fn new(
        search_id: impl Into<String>,
        failed: SearchMode,
        fallback: SearchMode,
        error: impl Into<String>,
    ) -> Self {
        Self {
            search_id: search_id.into(),
            failed,
            fallback,
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}
