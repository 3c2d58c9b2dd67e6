//! Shared application state.

use std::sync::Arc;

use crate::profile::ProfileLookup;
use crate::storage::DocumentStore;

pub struct AppState {
    /// `None` when the store could not be opened at startup.
    pub store: Option<Arc<dyn DocumentStore>>,
    pub profiles: Arc<dyn ProfileLookup>,
}

impl AppState {
    pub fn new(store: Option<Arc<dyn DocumentStore>>, profiles: Arc<dyn ProfileLookup>) -> Self {
        Self { store, profiles }
    }

    pub fn store_connected(&self) -> bool {
        self.store.is_some()
    }
}

pub type SharedState = Arc<AppState>;
