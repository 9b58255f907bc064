//! Application state shared across handlers.

use gridkeep_core::config::AppConfig;
use gridkeep_metadata::{MetadataStore, MetadataTx};
use std::sync::Arc;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: AppConfig, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
        }
    }

    /// Start a unit of work against the metadata store.
    pub async fn begin(&self) -> gridkeep_metadata::MetadataResult<Box<dyn MetadataTx>> {
        self.metadata.begin().await
    }
}
