use std::sync::Arc;

use crate::store::SharedStore;

/// Application state shared across all HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    /// Reported by the health check
    pub service_name: Arc<str>,
}

impl AppState {
    pub fn new(store: SharedStore, service_name: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            service_name: service_name.into(),
        }
    }
}
