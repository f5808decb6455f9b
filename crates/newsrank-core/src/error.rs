//! Error types for newsrank operations.
//!
//! Structured variants carry a stable error code so the HTTP layer and
//! callers can branch on the failure class without string matching.

use thiserror::Error;

/// Result type alias for newsrank operations.
pub type NewsrankResult<T> = Result<T, NewsrankError>;

/// Main error type for all newsrank operations.
#[derive(Error, Debug)]
pub enum NewsrankError {
    /// Embedding generation failed.
    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Dense or sparse vector index query failed.
    #[error("Vector index error: {message}")]
    VectorIndex {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Article store or BM25 corpus store operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// Both retrievers failed in hybrid mode.
    #[error("All retrievers failed (dense: {dense}; sparse: {sparse})")]
    AllRetrieversFailed { dense: String, sparse: String },

    /// The caller cancelled the search.
    #[error("Search cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Embedding (EMB_xxx)
    EmbConnectionFailed,
    EmbGenerationFailed,
    EmbDimensionMismatch,

    // Vector index (IDX_xxx)
    IdxConnectionFailed,
    IdxQueryFailed,
    IdxInvalidResponse,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,

    // Validation (VAL_xxx)
    ValInvalidLimit,

    // Retrieval (RET_xxx)
    RetAllFailed,
    RetCancelled,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::EmbConnectionFailed => "EMB_001",
            ErrorCode::EmbGenerationFailed => "EMB_002",
            ErrorCode::EmbDimensionMismatch => "EMB_003",
            ErrorCode::IdxConnectionFailed => "IDX_001",
            ErrorCode::IdxQueryFailed => "IDX_002",
            ErrorCode::IdxInvalidResponse => "IDX_003",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::ValInvalidLimit => "VAL_002",
            ErrorCode::RetAllFailed => "RET_001",
            ErrorCode::RetCancelled => "RET_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl NewsrankError {
    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbGenerationFailed,
            source: None,
        }
    }

    /// Create a vector index error.
    pub fn vector_index(message: impl Into<String>) -> Self {
        Self::VectorIndex {
            message: message.into(),
            code: ErrorCode::IdxQueryFailed,
            source: None,
        }
    }

    /// Create a vector index error for a malformed response body.
    pub fn invalid_index_response(message: impl Into<String>) -> Self {
        Self::VectorIndex {
            message: message.into(),
            code: ErrorCode::IdxInvalidResponse,
            source: None,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create a validation error for an out-of-range result limit.
    pub fn invalid_limit(limit: usize, max: usize) -> Self {
        Self::Validation {
            message: format!("limit {} is out of range", limit),
            code: ErrorCode::ValInvalidLimit,
            suggestion: Some(format!("Use a limit between 1 and {}", max)),
        }
    }

    /// Whether this error is an embedding or index provider failure.
    ///
    /// Provider failures are fatal in single-method search and trigger the
    /// single-method fallback in hybrid search.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Embedding { .. } | Self::VectorIndex { .. })
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Embedding { code, .. } => *code,
            Self::VectorIndex { code, .. } => *code,
            Self::Database { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::AllRetrieversFailed { .. } => ErrorCode::RetAllFailed,
            Self::Cancelled => ErrorCode::RetCancelled,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Embedding { .. } => Some("Please check your embedding provider configuration"),
            Self::VectorIndex { .. } => Some("Please check your vector index connection settings"),
            Self::AllRetrieversFailed { .. } => {
                Some("Both dense and sparse search are unavailable; check provider health")
            }
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for NewsrankError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}

impl From<tokio::task::JoinError> for NewsrankError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Blocking task failed: {}", err))
    }
}
