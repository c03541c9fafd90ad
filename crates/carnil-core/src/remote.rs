//! Remote Payments Client
//!
//! Speaks the action protocol over HTTP: every method serializes its
//! [`Action`] and posts it to a Carnil endpoint (for example the one mounted
//! by `carnil-adapters`). Webhook checks run locally against the shared
//! secret since the endpoint does not expose them.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::action::Action;
use crate::client::PaymentsClient;
use crate::error::{CarnilError, Result};
use crate::signature;
use crate::types::{
    CarnilResponse, CreateCustomerRequest, Customer, CustomerListRequest, ListResponse, Params,
    Resource, UpdateCustomerRequest,
};

#[derive(Deserialize)]
struct HealthBody {
    healthy: bool,
}

/// HTTP client for a Carnil action endpoint
#[derive(Clone, Debug)]
pub struct RemoteClient {
    http: reqwest::Client,
    endpoint: String,
    headers: HeaderMap,
}

impl RemoteClient {
    /// `endpoint` is the action URL, e.g. `https://shop.example/api/carnil`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            headers: HeaderMap::new(),
        }
    }

    /// Attach a header to every request (identity, auth).
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CarnilError::Config(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CarnilError::Config(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Headers attached to every request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    async fn call<T: DeserializeOwned>(&self, action: Action) -> Result<CarnilResponse<T>> {
        tracing::debug!(action = %action.kind(), endpoint = %self.endpoint, "Posting action");

        let response = self
            .http
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(&action)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body: Value = response.json().await.unwrap_or_default();
        let message = body["error"]
            .as_str()
            .unwrap_or("Request failed")
            .to_string();

        if status.is_server_error() {
            Err(CarnilError::Provider(message))
        } else {
            Err(CarnilError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl PaymentsClient for RemoteClient {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<CarnilResponse<Customer>> {
        self.call(Action::CreateCustomer(request)).await
    }

    async fn get_customer(&self, id: &str) -> Result<CarnilResponse<Customer>> {
        self.call(Action::GetCustomer { id: id.into() }).await
    }

    async fn update_customer(
        &self,
        id: &str,
        updates: UpdateCustomerRequest,
    ) -> Result<CarnilResponse<Customer>> {
        self.call(Action::UpdateCustomer {
            id: id.into(),
            updates,
        })
        .await
    }

    async fn delete_customer(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        self.call(Action::DeleteCustomer { id: id.into() }).await
    }

    async fn list_customers(
        &self,
        request: Option<CustomerListRequest>,
    ) -> Result<CarnilResponse<ListResponse<Customer>>> {
        self.call(Action::ListCustomers { request }).await
    }

    async fn create_payment_intent(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        self.call(Action::CreatePaymentIntent(params)).await
    }

    async fn get_payment_intent(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        self.call(Action::GetPaymentIntent { id: id.into() }).await
    }

    async fn update_payment_intent(
        &self,
        id: &str,
        updates: Params,
    ) -> Result<CarnilResponse<Resource>> {
        self.call(Action::UpdatePaymentIntent {
            id: id.into(),
            updates,
        })
        .await
    }

    async fn cancel_payment_intent(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        self.call(Action::CancelPaymentIntent { id: id.into() }).await
    }

    async fn confirm_payment_intent(
        &self,
        id: &str,
        payment_method_id: Option<&str>,
    ) -> Result<CarnilResponse<Resource>> {
        self.call(Action::ConfirmPaymentIntent {
            id: id.into(),
            payment_method_id: payment_method_id.map(str::to_owned),
        })
        .await
    }

    async fn capture_payment_intent(
        &self,
        id: &str,
        amount: Option<i64>,
    ) -> Result<CarnilResponse<Resource>> {
        self.call(Action::CapturePaymentIntent {
            id: id.into(),
            amount,
        })
        .await
    }

    async fn list_payment_intents(
        &self,
        request: Option<Params>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>> {
        self.call(Action::ListPaymentIntents { request }).await
    }

    async fn create_subscription(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        self.call(Action::CreateSubscription(params)).await
    }

    async fn get_subscription(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        self.call(Action::GetSubscription { id: id.into() }).await
    }

    async fn update_subscription(
        &self,
        id: &str,
        updates: Params,
    ) -> Result<CarnilResponse<Resource>> {
        self.call(Action::UpdateSubscription {
            id: id.into(),
            updates,
        })
        .await
    }

    async fn cancel_subscription(
        &self,
        id: &str,
        immediately: Option<bool>,
    ) -> Result<CarnilResponse<Resource>> {
        self.call(Action::CancelSubscription {
            id: id.into(),
            immediately,
        })
        .await
    }

    async fn list_subscriptions(
        &self,
        request: Option<Params>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>> {
        self.call(Action::ListSubscriptions { request }).await
    }

    async fn create_invoice(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        self.call(Action::CreateInvoice(params)).await
    }

    async fn get_invoice(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        self.call(Action::GetInvoice { id: id.into() }).await
    }

    async fn update_invoice(
        &self,
        id: &str,
        updates: Params,
    ) -> Result<CarnilResponse<Resource>> {
        self.call(Action::UpdateInvoice {
            id: id.into(),
            updates,
        })
        .await
    }

    async fn finalize_invoice(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        self.call(Action::FinalizeInvoice { id: id.into() }).await
    }

    async fn pay_invoice(
        &self,
        id: &str,
        payment_method_id: Option<&str>,
    ) -> Result<CarnilResponse<Resource>> {
        self.call(Action::PayInvoice {
            id: id.into(),
            payment_method_id: payment_method_id.map(str::to_owned),
        })
        .await
    }

    async fn list_invoices(
        &self,
        request: Option<Params>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>> {
        self.call(Action::ListInvoices { request }).await
    }

    async fn create_refund(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        self.call(Action::CreateRefund(params)).await
    }

    async fn get_refund(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        self.call(Action::GetRefund { id: id.into() }).await
    }

    async fn list_refunds(
        &self,
        payment_id: Option<&str>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>> {
        self.call(Action::ListRefunds {
            payment_id: payment_id.map(str::to_owned),
        })
        .await
    }

    async fn track_usage(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        self.call(Action::TrackUsage(params)).await
    }

    async fn track_ai_usage(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        self.call(Action::TrackAiUsage(params)).await
    }

    async fn get_usage_metrics(
        &self,
        customer_id: &str,
        feature_id: &str,
        period: &str,
    ) -> Result<CarnilResponse<Resource>> {
        self.call(Action::GetUsageMetrics {
            customer_id: customer_id.into(),
            feature_id: feature_id.into(),
            period: period.into(),
        })
        .await
    }

    async fn get_ai_usage_metrics(
        &self,
        customer_id: &str,
        model_id: Option<&str>,
        period: Option<&str>,
    ) -> Result<CarnilResponse<Resource>> {
        self.call(Action::GetAiUsageMetrics {
            customer_id: customer_id.into(),
            model_id: model_id.map(str::to_owned),
            period: period.map(str::to_owned),
        })
        .await
    }

    async fn verify_webhook(&self, body: &str, signature: &str, secret: &str) -> Result<bool> {
        Ok(signature::verify(body, signature, secret))
    }

    async fn parse_webhook(&self, body: &str, signature: &str, secret: &str) -> Result<Resource> {
        if !signature::verify(body, signature, secret) {
            return Err(CarnilError::WebhookSignature("signature mismatch".into()));
        }
        serde_json::from_str(body).map_err(|e| CarnilError::WebhookParse(e.to_string()))
    }

    /// `GET <endpoint>/health`, expecting `{"healthy": bool}`
    async fn health_check(&self) -> Result<bool> {
        let response = self
            .http
            .get(format!("{}/health", self.endpoint))
            .headers(self.headers.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(false);
        }
        Ok(response.json::<HealthBody>().await?.healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_normalised() {
        let client = RemoteClient::new("http://localhost:3000/api/carnil/");
        assert_eq!(client.endpoint(), "http://localhost:3000/api/carnil");
    }

    #[test]
    fn test_rejects_bad_header() {
        let err = RemoteClient::new("http://localhost")
            .with_header("x-customer-id", "bad\nvalue")
            .unwrap_err();
        assert!(matches!(err, CarnilError::Config(_)));
    }

    #[tokio::test]
    async fn test_webhook_checks_are_local() {
        let client = RemoteClient::new("http://localhost:9");
        let body = r#"{"id":"evt_1"}"#;
        let header = signature::sign_with_timestamp(body, "whsec", 10);

        assert!(client.verify_webhook(body, &header, "whsec").await.unwrap());
        let event = client.parse_webhook(body, &header, "whsec").await.unwrap();
        assert_eq!(event["id"], "evt_1");
    }
}
