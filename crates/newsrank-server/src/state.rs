//! Server state management.

use std::sync::Arc;

use newsrank_core::HybridSearchEngine;
use tokio_util::sync::CancellationToken;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<HybridSearchEngine>,
    /// Cancelled on shutdown; every search runs under a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create a new application state.
    pub fn new(engine: HybridSearchEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token for one request, cancelled when the server shuts down.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
