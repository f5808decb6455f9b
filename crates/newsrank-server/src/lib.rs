//! newsrank-server - REST API server for newsrank.
//!
//! Exposes the hybrid search engine over HTTP.
//!
//! # Example
//!
//! ```ignore
//! use newsrank_core::NewsrankConfig;
//! use newsrank_server::{build_engine, create_server, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = build_engine(&NewsrankConfig::load()?)?;
//!     let app = create_server(AppState::new(engine));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod factory;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use factory::build_engine;
pub use state::AppState;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
