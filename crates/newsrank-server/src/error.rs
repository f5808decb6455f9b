//! Error handling for the REST API server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use newsrank_core::error::NewsrankError;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                suggestion: self.suggestion,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<NewsrankError> for ApiError {
    fn from(err: NewsrankError) -> Self {
        let status = match &err {
            NewsrankError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            NewsrankError::Configuration(_) | NewsrankError::UnsupportedProvider { .. } => {
                StatusCode::BAD_REQUEST
            }
            NewsrankError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            _ => {
                tracing::error!(error = %err, code = err.code().as_str(), "Search failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut api = ApiError::new(status, err.code().as_str(), err.to_string());
        if let Some(suggestion) = err.suggestion() {
            api = api.with_suggestion(suggestion);
        }
        api
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
