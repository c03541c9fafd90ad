//! Application State

use std::sync::Arc;

use carnil_adapters::{AdapterConfig, CorsHeaders, HeaderIdentity};
use carnil_core::{ClientConfig, MemoryClient, RemoteClient, SharedClient};

const DEFAULT_IDENTITY_HEADER: &str = "x-customer-id";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payments client every adapter route forwards to
    pub client: SharedClient,

    /// Client settings (provider name, webhook secret)
    pub config: ClientConfig,

    /// Upstream Carnil endpoint, `None` when running on the in-memory client
    pub upstream: Option<String>,
}

impl AppState {
    /// Pick the client from `CARNIL_UPSTREAM_URL`.
    ///
    /// The upstream client is shared by every request, so callers' own
    /// identities are not forwarded. When the upstream checks identity, set
    /// `CARNIL_UPSTREAM_CUSTOMER_ID` to the id this server acts as.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ClientConfig::from_env();
        let upstream = non_empty_env("CARNIL_UPSTREAM_URL");

        let client: SharedClient = match &upstream {
            Some(url) => Arc::new(upstream_client(
                url,
                config.provider.api_key.as_deref(),
                &identity_header(),
                non_empty_env("CARNIL_UPSTREAM_CUSTOMER_ID").as_deref(),
            )?),
            None => Arc::new(MemoryClient::new(config.clone())),
        };

        Ok(Self {
            client,
            config,
            upstream,
        })
    }

    /// Adapter settings from `CARNIL_IDENTITY_HEADER` and `CARNIL_CORS_HEADERS`.
    pub fn adapter_config(&self) -> anyhow::Result<AdapterConfig> {
        let identity_header = identity_header();
        let cors = cors_headers(
            &identity_header,
            std::env::var("CARNIL_CORS_HEADERS").ok().as_deref(),
        )?;

        Ok(AdapterConfig::new(self.client.clone(), self.config.clone())
            .with_identify(HeaderIdentity::new(identity_header))
            .with_cors_headers(cors))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn identity_header() -> String {
    non_empty_env("CARNIL_IDENTITY_HEADER").unwrap_or_else(|| DEFAULT_IDENTITY_HEADER.into())
}

/// Client for an upstream Carnil endpoint
fn upstream_client(
    url: &str,
    api_key: Option<&str>,
    identity_header: &str,
    customer_id: Option<&str>,
) -> anyhow::Result<RemoteClient> {
    let mut remote = RemoteClient::new(url);
    if let Some(key) = api_key {
        remote = remote.with_header("authorization", &format!("Bearer {key}"))?;
    }
    if let Some(id) = customer_id {
        remote = remote.with_header(identity_header, id)?;
    }
    Ok(remote)
}

/// CORS overrides, with the identity header always allowed in preflight
fn cors_headers(identity_header: &str, list: Option<&str>) -> anyhow::Result<CorsHeaders> {
    let cors = match list {
        Some(list) => CorsHeaders::parse(list)?,
        None => CorsHeaders::new(),
    };
    Ok(cors.allow_header(identity_header))
}
