//! axum Binding
//!
//! ```ignore
//! let carnil = carnil_adapters::axum::router(&config)?;
//! let app = Router::new().route("/", get(index)).merge(carnil);
//! ```

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::AdapterConfig;
use crate::error::Result;
use crate::handler::{CarnilHandler, Reply};
use crate::identity::RequestHeaders;
use crate::webhook::WebhookHandler;
use crate::{ACTION_PATH, HEALTH_PATH, WEBHOOK_PATH};

/// Router state
#[derive(Clone)]
pub struct CarnilState {
    pub handler: CarnilHandler,
    pub webhook: WebhookHandler,
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Carnil routes with CORS headers on every response.
///
/// Fails when a configured CORS header is not a valid HTTP header.
pub fn router<S>(config: &AdapterConfig) -> Result<Router<S>>
where
    S: Clone + Send + Sync + 'static,
{
    let state = CarnilState {
        handler: CarnilHandler::new(config),
        webhook: WebhookHandler::new(config),
    };

    let router = Router::new()
        .route(ACTION_PATH, post(action).options(action))
        .route(WEBHOOK_PATH, post(webhook).options(preflight))
        .route(HEALTH_PATH, get(health))
        .with_state(state);

    Ok(config
        .cors_headers
        .header_pairs()?
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(name, value))
        }))
}

async fn action(
    State(state): State<CarnilState>,
    method: Method,
    headers: HeaderMap,
    body: String,
) -> Reply {
    state
        .handler
        .handle(&method, &RequestHeaders::from(&headers), &body)
        .await
}

async fn webhook(
    State(state): State<CarnilState>,
    headers: HeaderMap,
    body: String,
) -> Reply {
    state
        .webhook
        .handle(&RequestHeaders::from(&headers), &body)
        .await
}

async fn preflight() -> Reply {
    Reply::preflight()
}

async fn health(State(state): State<CarnilState>) -> Reply {
    state.handler.health().await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use carnil_core::{ClientConfig, MemoryClient, signature};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::cors::CorsHeaders;

    fn app(client: &Arc<MemoryClient>, cors: CorsHeaders) -> Router {
        let config = AdapterConfig::new(
            client.clone(),
            ClientConfig::new("stripe").with_webhook_secret("whsec"),
        )
        .with_cors_headers(cors);
        router(&config).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_action_round_trip() {
        let client = Arc::new(MemoryClient::default());
        let response = app(&client, CorsHeaders::new())
            .oneshot(
                Request::post(ACTION_PATH)
                    .header("x-customer-id", "cus_caller")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"action":"createCustomer","email":"a@b.co"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["email"], "a@b.co");
        assert_eq!(client.calls_to("createCustomer").await.len(), 1);
    }

    #[tokio::test]
    async fn test_cors_on_errors_and_overrides() {
        let client = Arc::new(MemoryClient::default());
        let cors = CorsHeaders::new().with("Access-Control-Allow-Origin", "https://shop.example");

        let response = app(&client, cors)
            .oneshot(
                Request::post(ACTION_PATH)
                    .body(Body::from(r#"{"action":"getCustomer","id":"c"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://shop.example"
        );
        assert_eq!(
            response.headers()["access-control-allow-methods"],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
    }

    #[tokio::test]
    async fn test_preflight() {
        let client = Arc::new(MemoryClient::default());

        for path in [ACTION_PATH, WEBHOOK_PATH] {
            let response = app(&client, CorsHeaders::new())
                .oneshot(
                    Request::builder()
                        .method(Method::OPTIONS)
                        .uri(path)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()["access-control-allow-headers"],
                "Content-Type, Authorization"
            );
            assert_eq!(json_body(response).await, json!({}));
        }
        assert!(client.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_webhook_route() {
        let client = Arc::new(MemoryClient::default());
        let event = r#"{"id":"evt_1","type":"customer.created"}"#;

        let response = app(&client, CorsHeaders::new())
            .oneshot(
                Request::post(WEBHOOK_PATH)
                    .header("stripe-signature", signature::sign(event, "whsec"))
                    .body(Body::from(event))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"received": true}));
    }

    #[tokio::test]
    async fn test_health_route() {
        let client = Arc::new(MemoryClient::default());
        let response = app(&client, CorsHeaders::new())
            .oneshot(Request::get(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(json_body(response).await, json!({"healthy": true}));
    }

    #[test]
    fn test_invalid_cors_header_fails_mount() {
        let client = Arc::new(MemoryClient::default());
        let config = AdapterConfig::new(client, ClientConfig::new("stripe"))
            .with_cors_headers(CorsHeaders::new().with("X-Bad", "line\nbreak"));
        assert!(router::<()>(&config).is_err());
    }
}
