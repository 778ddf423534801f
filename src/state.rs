//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::voice::ConversationProvider;
use crate::db::Store;

/// State shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<ServerConfig>,
    /// Plan and session persistence.
    pub store: Arc<dyn Store>,
    /// Signed-URL issuing voice provider.
    pub voice: Arc<dyn ConversationProvider>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn Store>,
        voice: Arc<dyn ConversationProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            voice,
        }
    }
}
