//! Payments Client Strategy
//!
//! The fixed method contract every payments client implements. Adapters hold
//! a [`SharedClient`] built once at configuration time and call it for every
//! request; they never construct clients per request.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{
    CarnilResponse, CreateCustomerRequest, Customer, CustomerListRequest, ListResponse, Params,
    Resource, UpdateCustomerRequest,
};

/// Shared handle injected into handlers, hooks and providers.
pub type SharedClient = Arc<dyn PaymentsClient>;

/// Provider credentials
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Provider name (e.g. "stripe", "razorpay")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Secret used to verify inbound webhooks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

/// Client construction options
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub provider: ProviderConfig,

    #[serde(default)]
    pub debug: bool,
}

impl ClientConfig {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: ProviderConfig {
                name: provider.into(),
                ..Default::default()
            },
            debug: false,
        }
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.provider.webhook_secret = Some(secret.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Create from environment variables
    ///
    /// `CARNIL_PROVIDER` (default `stripe`), `CARNIL_API_KEY`,
    /// `CARNIL_WEBHOOK_SECRET`, `CARNIL_DEBUG`.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        Self {
            provider: ProviderConfig {
                name: non_empty("CARNIL_PROVIDER").unwrap_or_else(|| "stripe".into()),
                api_key: non_empty("CARNIL_API_KEY"),
                webhook_secret: non_empty("CARNIL_WEBHOOK_SECRET"),
            },
            debug: non_empty("CARNIL_DEBUG")
                .is_some_and(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")),
        }
    }
}

/// Strategy trait for payments clients.
///
/// One method per dispatchable action, plus webhook verification and a
/// health probe. Every action method resolves to the provider's envelope;
/// `Err` is reserved for failures the provider could not report itself.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait PaymentsClient: Send + Sync {
    // Customers
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<CarnilResponse<Customer>>;

    async fn get_customer(&self, id: &str) -> Result<CarnilResponse<Customer>>;

    async fn update_customer(
        &self,
        id: &str,
        updates: UpdateCustomerRequest,
    ) -> Result<CarnilResponse<Customer>>;

    async fn delete_customer(&self, id: &str) -> Result<CarnilResponse<Resource>>;

    async fn list_customers(
        &self,
        request: Option<CustomerListRequest>,
    ) -> Result<CarnilResponse<ListResponse<Customer>>>;

    // Payment intents
    async fn create_payment_intent(&self, params: Params) -> Result<CarnilResponse<Resource>>;

    async fn get_payment_intent(&self, id: &str) -> Result<CarnilResponse<Resource>>;

    async fn update_payment_intent(
        &self,
        id: &str,
        updates: Params,
    ) -> Result<CarnilResponse<Resource>>;

    async fn cancel_payment_intent(&self, id: &str) -> Result<CarnilResponse<Resource>>;

    async fn confirm_payment_intent(
        &self,
        id: &str,
        payment_method_id: Option<&str>,
    ) -> Result<CarnilResponse<Resource>>;

    async fn capture_payment_intent(
        &self,
        id: &str,
        amount: Option<i64>,
    ) -> Result<CarnilResponse<Resource>>;

    async fn list_payment_intents(
        &self,
        request: Option<Params>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>>;

    // Subscriptions
    async fn create_subscription(&self, params: Params) -> Result<CarnilResponse<Resource>>;

    async fn get_subscription(&self, id: &str) -> Result<CarnilResponse<Resource>>;

    async fn update_subscription(
        &self,
        id: &str,
        updates: Params,
    ) -> Result<CarnilResponse<Resource>>;

    async fn cancel_subscription(
        &self,
        id: &str,
        immediately: Option<bool>,
    ) -> Result<CarnilResponse<Resource>>;

    async fn list_subscriptions(
        &self,
        request: Option<Params>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>>;

    // Invoices
    async fn create_invoice(&self, params: Params) -> Result<CarnilResponse<Resource>>;

    async fn get_invoice(&self, id: &str) -> Result<CarnilResponse<Resource>>;

    async fn update_invoice(&self, id: &str, updates: Params)
    -> Result<CarnilResponse<Resource>>;

    async fn finalize_invoice(&self, id: &str) -> Result<CarnilResponse<Resource>>;

    async fn pay_invoice(
        &self,
        id: &str,
        payment_method_id: Option<&str>,
    ) -> Result<CarnilResponse<Resource>>;

    async fn list_invoices(
        &self,
        request: Option<Params>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>>;

    // Refunds
    async fn create_refund(&self, params: Params) -> Result<CarnilResponse<Resource>>;

    async fn get_refund(&self, id: &str) -> Result<CarnilResponse<Resource>>;

    async fn list_refunds(
        &self,
        payment_id: Option<&str>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>>;

    // Usage tracking
    async fn track_usage(&self, params: Params) -> Result<CarnilResponse<Resource>>;

    async fn track_ai_usage(&self, params: Params) -> Result<CarnilResponse<Resource>>;

    async fn get_usage_metrics(
        &self,
        customer_id: &str,
        feature_id: &str,
        period: &str,
    ) -> Result<CarnilResponse<Resource>>;

    async fn get_ai_usage_metrics(
        &self,
        customer_id: &str,
        model_id: Option<&str>,
        period: Option<&str>,
    ) -> Result<CarnilResponse<Resource>>;

    // Webhooks & health
    async fn verify_webhook(&self, body: &str, signature: &str, secret: &str) -> Result<bool>;

    async fn parse_webhook(&self, body: &str, signature: &str, secret: &str) -> Result<Resource>;

    async fn health_check(&self) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("razorpay")
            .with_webhook_secret("whsec_1")
            .with_debug(true);

        assert_eq!(config.provider.name, "razorpay");
        assert_eq!(config.provider.webhook_secret.as_deref(), Some("whsec_1"));
        assert!(config.debug);
    }

    #[test]
    fn test_config_wire_shape() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"provider":{"name":"stripe","apiKey":"sk_test","webhookSecret":"whsec"}}"#,
        )
        .unwrap();

        assert_eq!(config.provider.api_key.as_deref(), Some("sk_test"));
        assert!(!config.debug);
    }
}
