//! Carnil HTTP Server
//!
//! Axum server mounting the Carnil action, webhook and health routes on top
//! of a configured payments client.

mod handlers;
mod state;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carnil_adapters::AdapterConfig;

use crate::handlers::health_check;
use crate::state::AppState;

fn app(state: AppState, adapter: &AdapterConfig) -> anyhow::Result<Router> {
    let carnil: Router = carnil_adapters::axum::router(adapter)?;

    Ok(Router::new()
        .route("/health", get(health_check))
        .with_state(state)
        .merge(carnil)
        .layer(TraceLayer::new_for_http()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let state = AppState::from_env()?;
    match &state.upstream {
        Some(url) => tracing::info!("✓ Forwarding actions to {}", url),
        None => {
            tracing::warn!("⚠ CARNIL_UPSTREAM_URL not set - using in-memory client");
            tracing::warn!("  Data is lost on restart");
        }
    }

    match state.client.health_check().await {
        Ok(true) => tracing::info!("✓ Payments client healthy"),
        Ok(false) | Err(_) => tracing::warn!("⚠ Payments client health check failed"),
    }

    if state.config.provider.webhook_secret.is_none() {
        tracing::warn!("⚠ CARNIL_WEBHOOK_SECRET not set - webhooks will be rejected");
    }

    let adapter = state.adapter_config()?;
    let app = app(state.clone(), &adapter)?;

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 carnil-server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Provider: {}", state.config.provider.name);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health              - Server health");
    tracing::info!("  POST /api/carnil          - Dispatch action");
    tracing::info!("  POST /api/carnil/webhook  - Verify webhook");
    tracing::info!("  GET  /api/carnil/health   - Client health");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use carnil_core::{ClientConfig, MemoryClient};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    fn test_app() -> Router {
        let config = ClientConfig::new("stripe");
        let state = AppState {
            client: Arc::new(MemoryClient::new(config.clone())),
            config,
            upstream: None,
        };
        let adapter = AdapterConfig::new(state.client.clone(), state.config.clone());
        app(state, &adapter).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["provider"], "stripe");
    }

    #[tokio::test]
    async fn test_carnil_routes_mounted() {
        let response = test_app()
            .oneshot(
                Request::post("/api/carnil")
                    .header("x-customer-id", "cus_1")
                    .body(Body::from(r#"{"action":"listCustomers"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
