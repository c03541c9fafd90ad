//! Action Dispatch Handler
//!
//! Framework-neutral request handling for the action endpoint. Host bindings
//! translate their request into `(method, headers, body)` and their response
//! from a [`Reply`].

use std::sync::Arc;

use carnil_core::{Action, ActionError, SharedClient};
use http::{Method, StatusCode};
use serde_json::{Value, json};

use crate::config::AdapterConfig;
use crate::identity::{Identify, RequestHeaders};

/// Status plus JSON body, before any framework conversion
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// Local rejection, `{error}` only
    pub fn rejected(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": error.into() }),
        }
    }

    /// Unexpected failure, `{error, success: false}`
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "error": error.into(), "success": false }),
        }
    }

    /// Empty preflight answer
    pub fn preflight() -> Self {
        Self::ok(json!({}))
    }
}

/// Handles `POST /api/carnil`
#[derive(Clone)]
pub struct CarnilHandler {
    client: SharedClient,
    identify: Arc<dyn Identify>,
    debug: bool,
}

impl CarnilHandler {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            client: config.client.clone(),
            identify: config.identify.clone(),
            debug: config.debug,
        }
    }

    pub fn client(&self) -> &SharedClient {
        &self.client
    }

    pub async fn handle(&self, method: &Method, headers: &RequestHeaders, body: &str) -> Reply {
        if *method == Method::OPTIONS {
            return Reply::preflight();
        }

        let identity = match self.identify.identify(headers).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!("Identify error: {}", e);
                return Reply::failed(e.to_string());
            }
        };
        if !identity.is_identified() {
            tracing::warn!("Rejected request without customer id");
            return Reply::rejected(StatusCode::UNAUTHORIZED, "Customer ID is required");
        }

        let action = match Action::from_body(body) {
            Ok(action) => action,
            Err(ActionError::Unknown(name)) => {
                tracing::warn!(action = %name, "Unknown action");
                return Reply::rejected(StatusCode::BAD_REQUEST, format!("Unknown action: {name}"));
            }
            Err(e) => {
                tracing::error!("Request decode error: {}", e);
                return Reply::failed(e.to_string());
            }
        };

        let kind = action.kind();
        if self.debug {
            tracing::debug!(action = %kind, customer = %identity.customer_id, "Dispatching action");
        }

        match action.dispatch(self.client.as_ref()).await {
            Ok(envelope) => Reply::ok(envelope),
            Err(e) => {
                tracing::error!(action = %kind, "Carnil API error: {}", e);
                Reply::failed(e.to_string())
            }
        }
    }

    /// `{healthy}` from the client's own probe
    pub async fn health(&self) -> Reply {
        let healthy = match self.client.health_check().await {
            Ok(healthy) => healthy,
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                false
            }
        };
        Reply::ok(json!({ "healthy": healthy }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carnil_core::{ActionKind, ClientConfig, Customer, Fault, MemoryClient};

    use crate::identity::FnIdentify;
    use crate::{AdapterError, Identity};

    fn handler(client: &Arc<MemoryClient>) -> CarnilHandler {
        let config = AdapterConfig::new(client.clone(), ClientConfig::new("stripe"));
        CarnilHandler::new(&config)
    }

    fn caller() -> RequestHeaders {
        RequestHeaders::from_pairs([("x-customer-id", "cus_caller")])
    }

    #[tokio::test]
    async fn test_dispatches_get_customer() {
        let client = Arc::new(MemoryClient::default());
        client
            .insert_customer(Customer {
                id: "cus_1".into(),
                email: Some("a@b.co".into()),
                ..Default::default()
            })
            .await;

        let reply = handler(&client)
            .handle(&Method::POST, &caller(), r#"{"action":"getCustomer","id":"cus_1"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["success"], true);
        assert_eq!(reply.body["data"]["email"], "a@b.co");

        let calls = client.calls_to("getCustomer").await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args, vec![json!("cus_1")]);
    }

    #[tokio::test]
    async fn test_params_forwarded_by_name() {
        let client = Arc::new(MemoryClient::default());
        let reply = handler(&client)
            .handle(
                &Method::POST,
                &caller(),
                r#"{"action":"getUsageMetrics","customerId":"c","featureId":"f","period":"month"}"#,
            )
            .await;

        assert_eq!(reply.status, StatusCode::OK);
        let calls = client.calls_to("getUsageMetrics").await;
        assert_eq!(calls[0].args, vec![json!("c"), json!("f"), json!("month")]);
    }

    /// Params for `kind` and the arguments the client should receive
    fn sample_call(kind: ActionKind) -> (Value, Vec<Value>) {
        use ActionKind as K;

        match kind {
            K::GetCustomer
            | K::DeleteCustomer
            | K::GetPaymentIntent
            | K::CancelPaymentIntent
            | K::GetSubscription
            | K::GetInvoice
            | K::FinalizeInvoice
            | K::GetRefund => (json!({"id": "id_1"}), vec![json!("id_1")]),
            K::UpdateCustomer | K::UpdatePaymentIntent | K::UpdateSubscription | K::UpdateInvoice => (
                json!({"id": "id_1", "updates": {"name": "Renamed"}}),
                vec![json!("id_1"), json!({"name": "Renamed"})],
            ),
            K::CreateCustomer
            | K::CreatePaymentIntent
            | K::CreateSubscription
            | K::CreateInvoice
            | K::CreateRefund
            | K::TrackUsage
            | K::TrackAiUsage => (json!({"name": "Fresh"}), vec![json!({"name": "Fresh"})]),
            K::ListCustomers | K::ListPaymentIntents | K::ListSubscriptions | K::ListInvoices => (
                json!({"request": {"limit": 5}}),
                vec![json!({"limit": 5})],
            ),
            K::ConfirmPaymentIntent | K::PayInvoice => (
                json!({"id": "id_1", "paymentMethodId": "pm_1"}),
                vec![json!("id_1"), json!("pm_1")],
            ),
            K::CapturePaymentIntent => (
                json!({"id": "id_1", "amount": 50}),
                vec![json!("id_1"), json!(50)],
            ),
            K::CancelSubscription => (
                json!({"id": "id_1", "immediately": false}),
                vec![json!("id_1"), json!(false)],
            ),
            K::ListRefunds => (json!({"paymentId": "pi_1"}), vec![json!("pi_1")]),
            K::GetUsageMetrics => (
                json!({"customerId": "c", "featureId": "f", "period": "month"}),
                vec![json!("c"), json!("f"), json!("month")],
            ),
            K::GetAiUsageMetrics => (
                json!({"customerId": "c", "modelId": "m", "period": "month"}),
                vec![json!("c"), json!("m"), json!("month")],
            ),
        }
    }

    #[tokio::test]
    async fn test_every_action_reaches_its_method() {
        for kind in ActionKind::ALL {
            let client = Arc::new(MemoryClient::default());
            let (mut body, expected_args) = sample_call(kind);
            body["action"] = json!(kind.as_str());

            let reply = handler(&client)
                .handle(&Method::POST, &caller(), &body.to_string())
                .await;
            assert_eq!(reply.status, StatusCode::OK, "{kind}");

            let calls = client.calls().await;
            assert_eq!(calls.len(), 1, "{kind}");
            assert_eq!(calls[0].method, kind.as_str());
            assert_eq!(calls[0].args, expected_args, "{kind}");
        }
    }

    #[tokio::test]
    async fn test_unknown_action_is_400_without_calls() {
        let client = Arc::new(MemoryClient::default());
        let reply = handler(&client)
            .handle(&Method::POST, &caller(), r#"{"action":"refundEverything"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body, json!({"error": "Unknown action: refundEverything"}));
        assert!(client.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_body_is_unknown_action() {
        let client = Arc::new(MemoryClient::default());
        let reply = handler(&client).handle(&Method::POST, &caller(), "").await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["error"], "Unknown action: undefined");
    }

    #[tokio::test]
    async fn test_malformed_body_is_500() {
        let client = Arc::new(MemoryClient::default());
        let reply = handler(&client)
            .handle(&Method::POST, &caller(), "{not json")
            .await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body["success"], false);
    }

    #[tokio::test]
    async fn test_missing_identity_is_401() {
        let client = Arc::new(MemoryClient::default());
        let reply = handler(&client)
            .handle(
                &Method::POST,
                &RequestHeaders::default(),
                r#"{"action":"getCustomer","id":"cus_1"}"#,
            )
            .await;

        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body, json!({"error": "Customer ID is required"}));
        assert!(client.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_options_skips_identity_and_dispatch() {
        let client = Arc::new(MemoryClient::default());
        let config = AdapterConfig::new(client.clone(), ClientConfig::new("stripe"))
            .with_identify(FnIdentify(|_: &RequestHeaders| -> crate::Result<Identity> {
                Err(AdapterError::Identify("must not run".into()))
            }));

        let reply = CarnilHandler::new(&config)
            .handle(&Method::OPTIONS, &RequestHeaders::default(), "")
            .await;

        assert_eq!(reply, Reply::preflight());
        assert!(client.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_client_error_is_500() {
        let client = Arc::new(MemoryClient::default());
        client
            .fail("createInvoice", Fault::Error("provider down".into()))
            .await;

        let reply = handler(&client)
            .handle(&Method::POST, &caller(), r#"{"action":"createInvoice","customerId":"c"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body, json!({"error": "provider down", "success": false}));
    }

    #[tokio::test]
    async fn test_rejected_envelope_passes_through() {
        let client = Arc::new(MemoryClient::default());
        client
            .fail("deleteCustomer", Fault::Reject("customer has open invoices".into()))
            .await;

        let reply = handler(&client)
            .handle(&Method::POST, &caller(), r#"{"action":"deleteCustomer","id":"cus_1"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["success"], false);
        assert_eq!(reply.body["error"], "customer has open invoices");
    }

    #[tokio::test]
    async fn test_health() {
        let client = Arc::new(MemoryClient::default());
        let handler = handler(&client);
        assert_eq!(handler.health().await.body, json!({"healthy": true}));

        client.set_healthy(false);
        assert_eq!(handler.health().await.body, json!({"healthy": false}));
    }
}
