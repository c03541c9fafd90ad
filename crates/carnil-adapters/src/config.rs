//! Adapter Configuration

use std::sync::Arc;

use carnil_core::{ClientConfig, ProviderConfig, SharedClient};

use crate::cors::CorsHeaders;
use crate::identity::{HeaderIdentity, Identify};

/// Everything an adapter needs, built once at mount time
#[derive(Clone)]
pub struct AdapterConfig {
    /// Client every request is forwarded to
    pub client: SharedClient,

    /// Provider credentials (webhook secret lives here)
    pub provider: ProviderConfig,

    /// Resolves the calling customer
    pub identify: Arc<dyn Identify>,

    /// Overrides layered on the default CORS headers
    pub cors_headers: CorsHeaders,

    /// Log every dispatched action
    pub debug: bool,
}

impl AdapterConfig {
    pub fn new(client: SharedClient, config: ClientConfig) -> Self {
        Self {
            client,
            provider: config.provider,
            identify: Arc::new(HeaderIdentity::default()),
            cors_headers: CorsHeaders::default(),
            debug: config.debug,
        }
    }

    pub fn with_identify(mut self, identify: impl Identify + 'static) -> Self {
        self.identify = Arc::new(identify);
        self
    }

    pub fn with_cors_headers(mut self, headers: CorsHeaders) -> Self {
        self.cors_headers = headers;
        self
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.provider
            .webhook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

impl std::fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("provider", &self.provider.name)
            .field("cors_headers", &self.cors_headers)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
