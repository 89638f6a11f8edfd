//! Application state for the web layer.

use std::sync::Arc;

use crate::query::QueryService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Query facade over the live catalog
    pub queries: Arc<QueryService>,
}

impl AppState {
    pub fn new(queries: QueryService) -> Self {
        Self {
            queries: Arc::new(queries),
        }
    }
}
