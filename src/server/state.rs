use std::sync::Arc;

use crate::config::AppConfig;
use crate::query::QueryService;
use crate::storage::BlobStore;

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub query: QueryService,
    pub default_page_size: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn BlobStore>, config: &AppConfig) -> Self {
        Self {
            query: QueryService::new(store, config.containers.outputs.clone()),
            default_page_size: config.query.default_page_size,
        }
    }
}
