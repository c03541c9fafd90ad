//! In-memory Payments Client
//!
//! A self-contained [`PaymentsClient`] for development and tests. Resources
//! live in process memory, the most recent calls are recorded, and individual
//! methods can be told to fail.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::client::{ClientConfig, PaymentsClient};
use crate::error::{CarnilError, Result};
use crate::signature;
use crate::types::{
    CarnilResponse, CreateCustomerRequest, Customer, CustomerListRequest, ListResponse, Params,
    Resource, UpdateCustomerRequest,
};

/// A recorded method invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    /// Method name in wire form (e.g. `getCustomer`, `verifyWebhook`)
    pub method: String,

    /// Arguments in positional order, as JSON
    pub args: Vec<Value>,
}

/// Calls kept by [`MemoryClient::calls`]; older ones are dropped.
pub const CALL_LOG_CAPACITY: usize = 256;

/// Injected failure for a method.
#[derive(Clone, Debug)]
pub enum Fault {
    /// Resolve with `{success: false, error}`. Methods without an envelope
    /// answer negatively instead: `verifyWebhook` and `healthCheck` with
    /// `false`, `parseWebhook` with a signature error.
    Reject(String),

    /// Fail the call itself
    Error(String),
}

#[derive(Default)]
struct Store {
    /// Newest first
    customers: Vec<Customer>,
    resources: HashMap<&'static str, Vec<Value>>,
    usage: Vec<Params>,
    ai_usage: Vec<Params>,
}

/// In-memory client
pub struct MemoryClient {
    config: ClientConfig,
    healthy: AtomicBool,
    store: RwLock<Store>,
    calls: RwLock<VecDeque<RecordedCall>>,
    faults: RwLock<HashMap<String, Fault>>,
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new(ClientConfig::new("memory"))
    }
}

impl MemoryClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            healthy: AtomicBool::new(true),
            store: RwLock::new(Store::default()),
            calls: RwLock::new(VecDeque::new()),
            faults: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Control the `health_check` answer
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Make `method` (wire name) fail until cleared
    pub async fn fail(&self, method: &str, fault: Fault) {
        self.faults.write().await.insert(method.to_string(), fault);
    }

    pub async fn clear_faults(&self) {
        self.faults.write().await.clear();
    }

    /// Recent calls, oldest first
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.iter().cloned().collect()
    }

    /// Calls to a single method
    pub async fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    /// Seed a customer without recording a call
    pub async fn insert_customer(&self, customer: Customer) {
        self.store.write().await.customers.insert(0, customer);
    }

    /// Record the call and apply any configured fault.
    ///
    /// `Ok(Some(_))` short-circuits with a rejected envelope.
    async fn enter<T>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Option<CarnilResponse<T>>> {
        Ok(self
            .enter_raw(method, args)
            .await?
            .map(CarnilResponse::failure))
    }

    /// Like [`Self::enter`], handing back the rejection message itself
    async fn enter_raw(&self, method: &str, args: Vec<Value>) -> Result<Option<String>> {
        if self.config.debug {
            tracing::debug!(method, ?args, "memory client call");
        }
        {
            let mut calls = self.calls.write().await;
            if calls.len() == CALL_LOG_CAPACITY {
                calls.pop_front();
            }
            calls.push_back(RecordedCall {
                method: method.to_string(),
                args,
            });
        }

        match self.faults.read().await.get(method) {
            Some(Fault::Reject(message)) => Ok(Some(message.clone())),
            Some(Fault::Error(message)) => Err(CarnilError::Provider(message.clone())),
            None => Ok(None),
        }
    }

    async fn insert_resource(&self, kind: &'static str, prefix: &str, params: Params) -> Value {
        let mut object = params;
        object.insert("id".into(), json!(new_id(prefix)));
        object.insert("object".into(), json!(kind));
        object.insert("created".into(), json!(Utc::now().timestamp()));
        object
            .entry("status")
            .or_insert_with(|| json!(initial_status(kind)));

        let value = Value::Object(object);
        self.store
            .write()
            .await
            .resources
            .entry(kind)
            .or_default()
            .insert(0, value.clone());
        value
    }

    async fn find_resource(&self, kind: &'static str, id: &str) -> CarnilResponse<Resource> {
        let store = self.store.read().await;
        store
            .resources
            .get(kind)
            .and_then(|items| items.iter().find(|item| item["id"] == id))
            .cloned()
            .map_or_else(|| not_found(kind, id), CarnilResponse::ok)
    }

    /// Apply `change` to a stored resource and return the new value
    async fn modify_resource(
        &self,
        kind: &'static str,
        id: &str,
        change: impl FnOnce(&mut Params),
    ) -> CarnilResponse<Resource> {
        let mut store = self.store.write().await;
        let found = store
            .resources
            .get_mut(kind)
            .and_then(|items| items.iter_mut().find(|item| item["id"] == id));

        match found {
            Some(Value::Object(object)) => {
                change(object);
                CarnilResponse::ok(Value::Object(object.clone()))
            }
            _ => not_found(kind, id),
        }
    }

    async fn list_resources(
        &self,
        kind: &'static str,
        request: Option<&Params>,
        matches: impl Fn(&Value) -> bool,
    ) -> CarnilResponse<ListResponse<Resource>> {
        let store = self.store.read().await;
        let all: Vec<Value> = store
            .resources
            .get(kind)
            .map(|items| items.iter().filter(|item| matches(item)).cloned().collect())
            .unwrap_or_default();

        let limit = request
            .and_then(|r| r.get("limit"))
            .and_then(Value::as_u64)
            .and_then(|limit| usize::try_from(limit).ok());
        CarnilResponse::ok(paginate(all, limit))
    }
}

fn new_id(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &id[..14])
}

fn initial_status(kind: &str) -> &'static str {
    match kind {
        "payment_intent" => "requires_confirmation",
        "subscription" => "active",
        "invoice" => "draft",
        "refund" => "succeeded",
        _ => "created",
    }
}

fn not_found<T>(kind: &str, id: &str) -> CarnilResponse<T> {
    CarnilResponse::failure(format!("No such {kind}: {id}"))
}

fn paginate<T>(items: Vec<T>, limit: Option<usize>) -> ListResponse<T> {
    let total = items.len();
    let mut data = items;
    if let Some(limit) = limit {
        data.truncate(limit);
    }

    let has_more = data.len() < total;
    ListResponse::new(data, has_more, u64::try_from(total).ok())
}

fn merge(target: &mut Params, updates: Params) {
    for (key, value) in updates {
        target.insert(key, value);
    }
}

fn number(params: &Params, key: &str) -> f64 {
    params.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn field_is(params: &Params, key: &str, expected: &str) -> bool {
    params.get(key).and_then(Value::as_str) == Some(expected)
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl PaymentsClient for MemoryClient {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<CarnilResponse<Customer>> {
        if let Some(rejected) = self
            .enter("createCustomer", vec![serde_json::to_value(&request)?])
            .await?
        {
            return Ok(rejected);
        }

        let mut extra = request.extra;
        extra.insert("created".into(), json!(Utc::now().timestamp()));
        let customer = Customer {
            id: new_id("cus"),
            email: request.email,
            name: request.name,
            description: request.description,
            metadata: request.metadata,
            extra,
        };

        self.store.write().await.customers.insert(0, customer.clone());
        Ok(CarnilResponse::ok(customer))
    }

    async fn get_customer(&self, id: &str) -> Result<CarnilResponse<Customer>> {
        if let Some(rejected) = self.enter("getCustomer", vec![json!(id)]).await? {
            return Ok(rejected);
        }

        let store = self.store.read().await;
        Ok(store
            .customers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map_or_else(|| not_found("customer", id), CarnilResponse::ok))
    }

    async fn update_customer(
        &self,
        id: &str,
        updates: UpdateCustomerRequest,
    ) -> Result<CarnilResponse<Customer>> {
        if let Some(rejected) = self
            .enter(
                "updateCustomer",
                vec![json!(id), serde_json::to_value(&updates)?],
            )
            .await?
        {
            return Ok(rejected);
        }

        let mut store = self.store.write().await;
        let Some(customer) = store.customers.iter_mut().find(|c| c.id == id) else {
            return Ok(not_found("customer", id));
        };

        if updates.email.is_some() {
            customer.email = updates.email;
        }
        if updates.name.is_some() {
            customer.name = updates.name;
        }
        if updates.description.is_some() {
            customer.description = updates.description;
        }
        if updates.metadata.is_some() {
            customer.metadata = updates.metadata;
        }
        merge(&mut customer.extra, updates.extra);

        Ok(CarnilResponse::ok(customer.clone()))
    }

    async fn delete_customer(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self.enter("deleteCustomer", vec![json!(id)]).await? {
            return Ok(rejected);
        }

        let mut store = self.store.write().await;
        let before = store.customers.len();
        store.customers.retain(|c| c.id != id);

        if store.customers.len() == before {
            Ok(not_found("customer", id))
        } else {
            Ok(CarnilResponse::done())
        }
    }

    async fn list_customers(
        &self,
        request: Option<CustomerListRequest>,
    ) -> Result<CarnilResponse<ListResponse<Customer>>> {
        if let Some(rejected) = self
            .enter("listCustomers", vec![serde_json::to_value(&request)?])
            .await?
        {
            return Ok(rejected);
        }

        let request = request.unwrap_or_default();
        let store = self.store.read().await;

        let mut customers: Vec<Customer> = store
            .customers
            .iter()
            .filter(|c| request.email.is_none() || c.email == request.email)
            .cloned()
            .collect();
        if let Some(cursor) = &request.starting_after {
            if let Some(position) = customers.iter().position(|c| &c.id == cursor) {
                customers.drain(..=position);
            }
        }

        Ok(CarnilResponse::ok(paginate(customers, request.limit)))
    }

    async fn create_payment_intent(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter("createPaymentIntent", vec![Value::Object(params.clone())])
            .await?
        {
            return Ok(rejected);
        }
        Ok(CarnilResponse::ok(
            self.insert_resource("payment_intent", "pi", params).await,
        ))
    }

    async fn get_payment_intent(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self.enter("getPaymentIntent", vec![json!(id)]).await? {
            return Ok(rejected);
        }
        Ok(self.find_resource("payment_intent", id).await)
    }

    async fn update_payment_intent(
        &self,
        id: &str,
        updates: Params,
    ) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter(
                "updatePaymentIntent",
                vec![json!(id), Value::Object(updates.clone())],
            )
            .await?
        {
            return Ok(rejected);
        }
        Ok(self
            .modify_resource("payment_intent", id, |pi| merge(pi, updates))
            .await)
    }

    async fn cancel_payment_intent(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self.enter("cancelPaymentIntent", vec![json!(id)]).await? {
            return Ok(rejected);
        }
        Ok(self
            .modify_resource("payment_intent", id, |pi| {
                pi.insert("status".into(), json!("canceled"));
            })
            .await)
    }

    async fn confirm_payment_intent(
        &self,
        id: &str,
        payment_method_id: Option<&str>,
    ) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter(
                "confirmPaymentIntent",
                vec![json!(id), json!(payment_method_id)],
            )
            .await?
        {
            return Ok(rejected);
        }
        Ok(self
            .modify_resource("payment_intent", id, |pi| {
                if let Some(method) = payment_method_id {
                    pi.insert("paymentMethodId".into(), json!(method));
                }
                pi.insert("status".into(), json!("requires_capture"));
            })
            .await)
    }

    async fn capture_payment_intent(
        &self,
        id: &str,
        amount: Option<i64>,
    ) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter("capturePaymentIntent", vec![json!(id), json!(amount)])
            .await?
        {
            return Ok(rejected);
        }
        Ok(self
            .modify_resource("payment_intent", id, |pi| {
                let captured = amount
                    .map(Value::from)
                    .or_else(|| pi.get("amount").cloned())
                    .unwrap_or(Value::Null);
                pi.insert("amountReceived".into(), captured);
                pi.insert("status".into(), json!("succeeded"));
            })
            .await)
    }

    async fn list_payment_intents(
        &self,
        request: Option<Params>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>> {
        if let Some(rejected) = self
            .enter("listPaymentIntents", vec![json!(request)])
            .await?
        {
            return Ok(rejected);
        }
        Ok(self
            .list_resources("payment_intent", request.as_ref(), |_| true)
            .await)
    }

    async fn create_subscription(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter("createSubscription", vec![Value::Object(params.clone())])
            .await?
        {
            return Ok(rejected);
        }
        Ok(CarnilResponse::ok(
            self.insert_resource("subscription", "sub", params).await,
        ))
    }

    async fn get_subscription(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self.enter("getSubscription", vec![json!(id)]).await? {
            return Ok(rejected);
        }
        Ok(self.find_resource("subscription", id).await)
    }

    async fn update_subscription(
        &self,
        id: &str,
        updates: Params,
    ) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter(
                "updateSubscription",
                vec![json!(id), Value::Object(updates.clone())],
            )
            .await?
        {
            return Ok(rejected);
        }
        Ok(self
            .modify_resource("subscription", id, |sub| merge(sub, updates))
            .await)
    }

    async fn cancel_subscription(
        &self,
        id: &str,
        immediately: Option<bool>,
    ) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter("cancelSubscription", vec![json!(id), json!(immediately)])
            .await?
        {
            return Ok(rejected);
        }
        Ok(self
            .modify_resource("subscription", id, |sub| {
                if immediately.unwrap_or(true) {
                    sub.insert("status".into(), json!("canceled"));
                } else {
                    sub.insert("cancelAtPeriodEnd".into(), json!(true));
                }
            })
            .await)
    }

    async fn list_subscriptions(
        &self,
        request: Option<Params>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>> {
        if let Some(rejected) = self
            .enter("listSubscriptions", vec![json!(request)])
            .await?
        {
            return Ok(rejected);
        }
        let customer = request
            .as_ref()
            .and_then(|r| r.get("customerId"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        Ok(self
            .list_resources("subscription", request.as_ref(), |sub| {
                customer.as_deref().is_none_or(|c| sub["customerId"] == c)
            })
            .await)
    }

    async fn create_invoice(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter("createInvoice", vec![Value::Object(params.clone())])
            .await?
        {
            return Ok(rejected);
        }
        Ok(CarnilResponse::ok(
            self.insert_resource("invoice", "in", params).await,
        ))
    }

    async fn get_invoice(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self.enter("getInvoice", vec![json!(id)]).await? {
            return Ok(rejected);
        }
        Ok(self.find_resource("invoice", id).await)
    }

    async fn update_invoice(
        &self,
        id: &str,
        updates: Params,
    ) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter(
                "updateInvoice",
                vec![json!(id), Value::Object(updates.clone())],
            )
            .await?
        {
            return Ok(rejected);
        }
        Ok(self
            .modify_resource("invoice", id, |invoice| merge(invoice, updates))
            .await)
    }

    async fn finalize_invoice(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self.enter("finalizeInvoice", vec![json!(id)]).await? {
            return Ok(rejected);
        }
        Ok(self
            .modify_resource("invoice", id, |invoice| {
                invoice.insert("status".into(), json!("open"));
            })
            .await)
    }

    async fn pay_invoice(
        &self,
        id: &str,
        payment_method_id: Option<&str>,
    ) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter("payInvoice", vec![json!(id), json!(payment_method_id)])
            .await?
        {
            return Ok(rejected);
        }
        Ok(self
            .modify_resource("invoice", id, |invoice| {
                if let Some(method) = payment_method_id {
                    invoice.insert("paymentMethodId".into(), json!(method));
                }
                invoice.insert("status".into(), json!("paid"));
            })
            .await)
    }

    async fn list_invoices(
        &self,
        request: Option<Params>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>> {
        if let Some(rejected) = self.enter("listInvoices", vec![json!(request)]).await? {
            return Ok(rejected);
        }
        Ok(self
            .list_resources("invoice", request.as_ref(), |_| true)
            .await)
    }

    async fn create_refund(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter("createRefund", vec![Value::Object(params.clone())])
            .await?
        {
            return Ok(rejected);
        }
        Ok(CarnilResponse::ok(
            self.insert_resource("refund", "re", params).await,
        ))
    }

    async fn get_refund(&self, id: &str) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self.enter("getRefund", vec![json!(id)]).await? {
            return Ok(rejected);
        }
        Ok(self.find_resource("refund", id).await)
    }

    async fn list_refunds(
        &self,
        payment_id: Option<&str>,
    ) -> Result<CarnilResponse<ListResponse<Resource>>> {
        if let Some(rejected) = self.enter("listRefunds", vec![json!(payment_id)]).await? {
            return Ok(rejected);
        }
        Ok(self
            .list_resources("refund", None, |refund| {
                payment_id.is_none_or(|p| refund["paymentId"] == p)
            })
            .await)
    }

    async fn track_usage(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter("trackUsage", vec![Value::Object(params.clone())])
            .await?
        {
            return Ok(rejected);
        }
        self.store.write().await.usage.push(params.clone());
        Ok(CarnilResponse::ok(Value::Object(params)))
    }

    async fn track_ai_usage(&self, params: Params) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter("trackAIUsage", vec![Value::Object(params.clone())])
            .await?
        {
            return Ok(rejected);
        }
        self.store.write().await.ai_usage.push(params.clone());
        Ok(CarnilResponse::ok(Value::Object(params)))
    }

    async fn get_usage_metrics(
        &self,
        customer_id: &str,
        feature_id: &str,
        period: &str,
    ) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter(
                "getUsageMetrics",
                vec![json!(customer_id), json!(feature_id), json!(period)],
            )
            .await?
        {
            return Ok(rejected);
        }

        let store = self.store.read().await;
        let (events, usage) = store
            .usage
            .iter()
            .filter(|u| field_is(u, "customerId", customer_id) && field_is(u, "featureId", feature_id))
            .fold((0_u64, 0.0), |(n, total), u| (n + 1, total + number(u, "quantity")));

        Ok(CarnilResponse::ok(json!({
            "customerId": customer_id,
            "featureId": feature_id,
            "period": period,
            "usage": usage,
            "events": events,
        })))
    }

    async fn get_ai_usage_metrics(
        &self,
        customer_id: &str,
        model_id: Option<&str>,
        period: Option<&str>,
    ) -> Result<CarnilResponse<Resource>> {
        if let Some(rejected) = self
            .enter(
                "getAIUsageMetrics",
                vec![json!(customer_id), json!(model_id), json!(period)],
            )
            .await?
        {
            return Ok(rejected);
        }

        let store = self.store.read().await;
        let (tokens, cost) = store
            .ai_usage
            .iter()
            .filter(|u| {
                field_is(u, "customerId", customer_id)
                    && model_id.is_none_or(|m| field_is(u, "modelId", m))
            })
            .fold((0.0, 0.0), |(tokens, cost), u| {
                (tokens + number(u, "tokens"), cost + number(u, "cost"))
            });

        Ok(CarnilResponse::ok(json!({
            "customerId": customer_id,
            "modelId": model_id,
            "period": period,
            "totalTokens": tokens,
            "totalCost": cost,
        })))
    }

    async fn verify_webhook(&self, body: &str, signature: &str, secret: &str) -> Result<bool> {
        if self
            .enter_raw("verifyWebhook", vec![json!(body), json!(signature)])
            .await?
            .is_some()
        {
            return Ok(false);
        }
        Ok(signature::verify(body, signature, secret))
    }

    async fn parse_webhook(&self, body: &str, signature: &str, secret: &str) -> Result<Resource> {
        if let Some(message) = self
            .enter_raw("parseWebhook", vec![json!(body), json!(signature)])
            .await?
        {
            return Err(CarnilError::WebhookSignature(message));
        }
        if !signature::verify(body, signature, secret) {
            return Err(CarnilError::WebhookSignature("signature mismatch".into()));
        }
        serde_json::from_str(body).map_err(|e| CarnilError::WebhookParse(e.to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        if self.enter_raw("healthCheck", Vec::new()).await?.is_some() {
            return Ok(false);
        }
        Ok(self.healthy.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(email: &str) -> CreateCustomerRequest {
        CreateCustomerRequest {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_customer_lifecycle() {
        let client = MemoryClient::default();

        let created = client.create_customer(create("a@b.co")).await.unwrap();
        let id = created.data.unwrap().id;
        assert!(id.starts_with("cus_"));

        let updated = client
            .update_customer(
                &id,
                UpdateCustomerRequest {
                    name: Some("Ada".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let customer = updated.data.unwrap();
        assert_eq!(customer.name.as_deref(), Some("Ada"));
        assert_eq!(customer.email.as_deref(), Some("a@b.co"));

        assert!(client.delete_customer(&id).await.unwrap().success);
        let missing = client.get_customer(&id).await.unwrap();
        assert!(!missing.success);
        assert_eq!(missing.error, Some(format!("No such customer: {id}")));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paginated() {
        let client = MemoryClient::default();
        for email in ["one@x.co", "two@x.co", "three@x.co"] {
            client.create_customer(create(email)).await.unwrap();
        }

        let page = client
            .list_customers(Some(CustomerListRequest {
                limit: Some(2),
                ..Default::default()
            }))
            .await
            .unwrap()
            .data
            .unwrap();

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].email.as_deref(), Some("three@x.co"));
        assert!(page.has_more);
        assert_eq!(page.total_count, Some(3));
    }

    #[tokio::test]
    async fn test_records_calls_and_applies_faults() {
        let client = MemoryClient::default();
        client
            .fail("getCustomer", Fault::Reject("card_declined".into()))
            .await;
        client
            .fail("getInvoice", Fault::Error("provider down".into()))
            .await;

        let rejected = client.get_customer("cus_1").await.unwrap();
        assert_eq!(rejected.error.as_deref(), Some("card_declined"));

        let err = client.get_invoice("in_1").await.unwrap_err();
        assert_eq!(err.to_string(), "provider down");

        let calls = client.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, "getCustomer");
        assert_eq!(calls[0].args, vec![json!("cus_1")]);
    }

    #[tokio::test]
    async fn test_payment_intent_flow() {
        let client = MemoryClient::default();
        let mut params = Params::new();
        params.insert("amount".into(), json!(2000));
        let pi = client.create_payment_intent(params).await.unwrap().data.unwrap();
        let id = pi["id"].as_str().unwrap().to_string();

        client.confirm_payment_intent(&id, Some("pm_1")).await.unwrap();
        let captured = client
            .capture_payment_intent(&id, None)
            .await
            .unwrap()
            .data
            .unwrap();

        assert_eq!(captured["status"], "succeeded");
        assert_eq!(captured["amountReceived"], 2000);
        assert_eq!(captured["paymentMethodId"], "pm_1");
    }

    #[tokio::test]
    async fn test_usage_metrics_sum_quantities() {
        let client = MemoryClient::default();
        for quantity in [3, 4] {
            let mut params = Params::new();
            params.insert("customerId".into(), json!("cus_1"));
            params.insert("featureId".into(), json!("api_calls"));
            params.insert("quantity".into(), json!(quantity));
            client.track_usage(params).await.unwrap();
        }

        let metrics = client
            .get_usage_metrics("cus_1", "api_calls", "month")
            .await
            .unwrap()
            .data
            .unwrap();
        assert_eq!(metrics["usage"], 7.0);
        assert_eq!(metrics["events"], 2);
    }

    #[tokio::test]
    async fn test_webhook_verification() {
        let client = MemoryClient::default();
        let body = r#"{"type":"customer.created"}"#;
        let signature = signature::sign(body, "whsec");

        assert!(client.verify_webhook(body, &signature, "whsec").await.unwrap());
        assert!(!client.verify_webhook(body, "bogus", "whsec").await.unwrap());

        let event = client.parse_webhook(body, &signature, "whsec").await.unwrap();
        assert_eq!(event["type"], "customer.created");
    }

    #[tokio::test]
    async fn test_reject_applies_to_non_envelope_methods() {
        let client = MemoryClient::default();
        let body = r#"{"type":"invoice.paid"}"#;
        let signature = signature::sign(body, "whsec");

        for method in ["verifyWebhook", "parseWebhook", "healthCheck"] {
            client.fail(method, Fault::Reject("replayed".into())).await;
        }

        assert!(!client.verify_webhook(body, &signature, "whsec").await.unwrap());
        assert!(matches!(
            client.parse_webhook(body, &signature, "whsec").await,
            Err(CarnilError::WebhookSignature(message)) if message == "replayed"
        ));
        assert!(!client.health_check().await.unwrap());

        client.clear_faults().await;
        assert!(client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_call_log_is_bounded() {
        let client = MemoryClient::default();
        client.get_customer("cus_first").await.unwrap();
        for _ in 0..CALL_LOG_CAPACITY + 10 {
            client.health_check().await.unwrap();
        }

        let calls = client.calls().await;
        assert_eq!(calls.len(), CALL_LOG_CAPACITY);
        assert!(calls.iter().all(|call| call.method == "healthCheck"));
        assert!(client.calls_to("getCustomer").await.is_empty());
    }
}
