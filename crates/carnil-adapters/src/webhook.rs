//! Webhook Verification Handler
//!
//! Verifies the provider signature with the configured secret, then asks the
//! client to parse the event exactly once. Event processing belongs to the
//! host application.

use carnil_core::SharedClient;
use http::StatusCode;
use serde_json::json;

use crate::config::AdapterConfig;
use crate::handler::Reply;
use crate::identity::RequestHeaders;

/// Signature headers, highest priority first
pub const SIGNATURE_HEADERS: [&str; 3] = ["stripe-signature", "razorpay-signature", "x-signature"];

/// First non-empty signature header, or `""`
pub fn signature_from(headers: &RequestHeaders) -> &str {
    SIGNATURE_HEADERS
        .iter()
        .find_map(|name| headers.non_empty(name))
        .unwrap_or_default()
}

/// Handles `POST /api/carnil/webhook`
#[derive(Clone)]
pub struct WebhookHandler {
    client: SharedClient,
    secret: Option<String>,
}

impl WebhookHandler {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            client: config.client.clone(),
            secret: config.webhook_secret().map(str::to_owned),
        }
    }

    pub async fn handle(&self, headers: &RequestHeaders, body: &str) -> Reply {
        let Some(secret) = self.secret.as_deref() else {
            tracing::warn!("Webhook received without a configured secret");
            return Reply::rejected(StatusCode::BAD_REQUEST, "Webhook secret not configured");
        };
        let signature = signature_from(headers);

        match self.client.verify_webhook(body, signature, secret).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Invalid webhook signature");
                return Reply::rejected(StatusCode::BAD_REQUEST, "Invalid webhook signature");
            }
            Err(e) => return Self::error(&e),
        }

        match self.client.parse_webhook(body, signature, secret).await {
            Ok(event) => {
                tracing::info!(
                    event_type = event["type"].as_str().unwrap_or("unknown"),
                    event_id = event["id"].as_str().unwrap_or_default(),
                    "Webhook event received"
                );
                Reply::ok(json!({ "received": true }))
            }
            Err(e) => Self::error(&e),
        }
    }

    fn error(e: &carnil_core::CarnilError) -> Reply {
        tracing::error!("Webhook error: {}", e);
        Reply::rejected(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}
