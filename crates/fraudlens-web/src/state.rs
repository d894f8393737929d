//! Application state.

use fraudlens_core::Analyzer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Analyzer,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer }
    }
}
