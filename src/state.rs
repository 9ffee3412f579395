//! Shared application state.

use crate::config::Config;
use crate::store::SessionStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_store(SessionStore::new(config))
    }

    pub fn with_store(store: SessionStore) -> Self {
        Self { store }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
