//! Application state shared across handlers.

use std::sync::Arc;

use crafthub_core::Username;
use crafthub_store::Store;

use crate::config::ServiceConfig;
use crate::fulfill::{FulfillmentSink, LogSink};
use crate::mojang::MojangClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Mojang profile client, if lookups are configured.
    pub mojang: Option<Arc<MojangClient>>,

    /// Destination for post-purchase fulfillment commands.
    pub fulfillment: Arc<dyn FulfillmentSink>,
}

impl AppState {
    /// Create application state from a store and configuration.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let mojang = match &config.mojang_api_url {
            Some(url) => {
                tracing::info!(url = %url, "Mojang profile lookups enabled");
                Some(Arc::new(MojangClient::new(url, &config.avatar_url_base)))
            }
            None => {
                tracing::warn!(
                    "Mojang profile lookups not configured - new players get the default avatar"
                );
                None
            }
        };

        if config.uses_dev_session_secret() {
            tracing::warn!("SESSION_SECRET not configured - using the development fallback");
        }

        Self {
            store,
            config,
            mojang,
            fulfillment: Arc::new(LogSink),
        }
    }

    /// Resolve the avatar for a new player, falling back to the default.
    pub async fn resolve_avatar(&self, username: &Username) -> String {
        if let Some(mojang) = &self.mojang {
            if let Some(url) = mojang.avatar_url(username).await {
                return url;
            }
        }
        self.config.default_avatar.clone()
    }
}
