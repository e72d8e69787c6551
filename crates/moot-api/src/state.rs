//! Shared application state.

use std::sync::Arc;

use moot_engine::Engine;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The orchestrator.
    pub engine: Arc<Engine>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}
