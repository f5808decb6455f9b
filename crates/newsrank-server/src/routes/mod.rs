//! Route definitions for the REST API.

mod health;
mod search;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/search", post(search::search_articles))
        .with_state(state)
}

pub use health::*;
pub use search::*;
