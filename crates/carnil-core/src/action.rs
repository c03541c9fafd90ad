//! Action Protocol
//!
//! Inbound requests carry `{action, ...params}`. The action name selects one
//! client method; the remaining fields are forwarded by name. The set of
//! actions is closed: [`Action`] has one variant per method and
//! [`Action::dispatch`] matches it exhaustively.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::PaymentsClient;
use crate::error::{ActionError, Result};
use crate::types::{
    CarnilResponse, CreateCustomerRequest, CustomerListRequest, Params, UpdateCustomerRequest,
};

/// Name of a dispatchable action, without its params.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateCustomer,
    GetCustomer,
    UpdateCustomer,
    DeleteCustomer,
    ListCustomers,
    CreatePaymentIntent,
    GetPaymentIntent,
    UpdatePaymentIntent,
    CancelPaymentIntent,
    ConfirmPaymentIntent,
    CapturePaymentIntent,
    ListPaymentIntents,
    CreateSubscription,
    GetSubscription,
    UpdateSubscription,
    CancelSubscription,
    ListSubscriptions,
    CreateInvoice,
    GetInvoice,
    UpdateInvoice,
    FinalizeInvoice,
    PayInvoice,
    ListInvoices,
    CreateRefund,
    GetRefund,
    ListRefunds,
    TrackUsage,
    TrackAiUsage,
    GetUsageMetrics,
    GetAiUsageMetrics,
}

impl ActionKind {
    pub const ALL: [ActionKind; 30] = [
        Self::CreateCustomer,
        Self::GetCustomer,
        Self::UpdateCustomer,
        Self::DeleteCustomer,
        Self::ListCustomers,
        Self::CreatePaymentIntent,
        Self::GetPaymentIntent,
        Self::UpdatePaymentIntent,
        Self::CancelPaymentIntent,
        Self::ConfirmPaymentIntent,
        Self::CapturePaymentIntent,
        Self::ListPaymentIntents,
        Self::CreateSubscription,
        Self::GetSubscription,
        Self::UpdateSubscription,
        Self::CancelSubscription,
        Self::ListSubscriptions,
        Self::CreateInvoice,
        Self::GetInvoice,
        Self::UpdateInvoice,
        Self::FinalizeInvoice,
        Self::PayInvoice,
        Self::ListInvoices,
        Self::CreateRefund,
        Self::GetRefund,
        Self::ListRefunds,
        Self::TrackUsage,
        Self::TrackAiUsage,
        Self::GetUsageMetrics,
        Self::GetAiUsageMetrics,
    ];

    /// Wire name, as sent in the `action` field
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateCustomer => "createCustomer",
            Self::GetCustomer => "getCustomer",
            Self::UpdateCustomer => "updateCustomer",
            Self::DeleteCustomer => "deleteCustomer",
            Self::ListCustomers => "listCustomers",
            Self::CreatePaymentIntent => "createPaymentIntent",
            Self::GetPaymentIntent => "getPaymentIntent",
            Self::UpdatePaymentIntent => "updatePaymentIntent",
            Self::CancelPaymentIntent => "cancelPaymentIntent",
            Self::ConfirmPaymentIntent => "confirmPaymentIntent",
            Self::CapturePaymentIntent => "capturePaymentIntent",
            Self::ListPaymentIntents => "listPaymentIntents",
            Self::CreateSubscription => "createSubscription",
            Self::GetSubscription => "getSubscription",
            Self::UpdateSubscription => "updateSubscription",
            Self::CancelSubscription => "cancelSubscription",
            Self::ListSubscriptions => "listSubscriptions",
            Self::CreateInvoice => "createInvoice",
            Self::GetInvoice => "getInvoice",
            Self::UpdateInvoice => "updateInvoice",
            Self::FinalizeInvoice => "finalizeInvoice",
            Self::PayInvoice => "payInvoice",
            Self::ListInvoices => "listInvoices",
            Self::CreateRefund => "createRefund",
            Self::GetRefund => "getRefund",
            Self::ListRefunds => "listRefunds",
            Self::TrackUsage => "trackUsage",
            Self::TrackAiUsage => "trackAIUsage",
            Self::GetUsageMetrics => "getUsageMetrics",
            Self::GetAiUsageMetrics => "getAIUsageMetrics",
        }
    }

    /// Parse a wire name. Matching is exact (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded action with its params.
///
/// Serializes back to the same `{action, ...params}` wire form, which is what
/// [`crate::RemoteClient`] sends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    CreateCustomer(CreateCustomerRequest),
    GetCustomer {
        id: String,
    },
    UpdateCustomer {
        id: String,
        #[serde(default)]
        updates: UpdateCustomerRequest,
    },
    DeleteCustomer {
        id: String,
    },
    ListCustomers {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request: Option<CustomerListRequest>,
    },

    CreatePaymentIntent(Params),
    GetPaymentIntent {
        id: String,
    },
    UpdatePaymentIntent {
        id: String,
        #[serde(default)]
        updates: Params,
    },
    CancelPaymentIntent {
        id: String,
    },
    ConfirmPaymentIntent {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payment_method_id: Option<String>,
    },
    CapturePaymentIntent {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<i64>,
    },
    ListPaymentIntents {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request: Option<Params>,
    },

    CreateSubscription(Params),
    GetSubscription {
        id: String,
    },
    UpdateSubscription {
        id: String,
        #[serde(default)]
        updates: Params,
    },
    CancelSubscription {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        immediately: Option<bool>,
    },
    ListSubscriptions {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request: Option<Params>,
    },

    CreateInvoice(Params),
    GetInvoice {
        id: String,
    },
    UpdateInvoice {
        id: String,
        #[serde(default)]
        updates: Params,
    },
    FinalizeInvoice {
        id: String,
    },
    PayInvoice {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payment_method_id: Option<String>,
    },
    ListInvoices {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request: Option<Params>,
    },

    CreateRefund(Params),
    GetRefund {
        id: String,
    },
    ListRefunds {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payment_id: Option<String>,
    },

    TrackUsage(Params),
    #[serde(rename = "trackAIUsage")]
    TrackAiUsage(Params),
    GetUsageMetrics {
        customer_id: String,
        feature_id: String,
        period: String,
    },
    #[serde(rename = "getAIUsageMetrics")]
    GetAiUsageMetrics {
        customer_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        period: Option<String>,
    },
}

impl Action {
    /// Decode a raw request body.
    ///
    /// An empty body counts as `{}`. The action name is checked before the
    /// params, so an unknown action never reports a params error.
    pub fn from_body(body: &str) -> std::result::Result<Self, ActionError> {
        let value = if body.trim().is_empty() {
            Value::Object(Params::new())
        } else {
            serde_json::from_str(body).map_err(ActionError::Malformed)?
        };
        Self::from_value(value)
    }

    /// Decode an already-parsed body.
    pub fn from_value(value: Value) -> std::result::Result<Self, ActionError> {
        let kind = match value.get("action") {
            Some(Value::String(name)) => {
                ActionKind::from_name(name).ok_or_else(|| ActionError::Unknown(name.clone()))?
            }
            Some(other) => return Err(ActionError::Unknown(other.to_string())),
            None => return Err(ActionError::Unknown("undefined".into())),
        };

        serde_json::from_value(value).map_err(|source| ActionError::Params {
            action: kind.as_str(),
            source,
        })
    }

    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::CreateCustomer(_) => ActionKind::CreateCustomer,
            Self::GetCustomer { .. } => ActionKind::GetCustomer,
            Self::UpdateCustomer { .. } => ActionKind::UpdateCustomer,
            Self::DeleteCustomer { .. } => ActionKind::DeleteCustomer,
            Self::ListCustomers { .. } => ActionKind::ListCustomers,
            Self::CreatePaymentIntent(_) => ActionKind::CreatePaymentIntent,
            Self::GetPaymentIntent { .. } => ActionKind::GetPaymentIntent,
            Self::UpdatePaymentIntent { .. } => ActionKind::UpdatePaymentIntent,
            Self::CancelPaymentIntent { .. } => ActionKind::CancelPaymentIntent,
            Self::ConfirmPaymentIntent { .. } => ActionKind::ConfirmPaymentIntent,
            Self::CapturePaymentIntent { .. } => ActionKind::CapturePaymentIntent,
            Self::ListPaymentIntents { .. } => ActionKind::ListPaymentIntents,
            Self::CreateSubscription(_) => ActionKind::CreateSubscription,
            Self::GetSubscription { .. } => ActionKind::GetSubscription,
            Self::UpdateSubscription { .. } => ActionKind::UpdateSubscription,
            Self::CancelSubscription { .. } => ActionKind::CancelSubscription,
            Self::ListSubscriptions { .. } => ActionKind::ListSubscriptions,
            Self::CreateInvoice(_) => ActionKind::CreateInvoice,
            Self::GetInvoice { .. } => ActionKind::GetInvoice,
            Self::UpdateInvoice { .. } => ActionKind::UpdateInvoice,
            Self::FinalizeInvoice { .. } => ActionKind::FinalizeInvoice,
            Self::PayInvoice { .. } => ActionKind::PayInvoice,
            Self::ListInvoices { .. } => ActionKind::ListInvoices,
            Self::CreateRefund(_) => ActionKind::CreateRefund,
            Self::GetRefund { .. } => ActionKind::GetRefund,
            Self::ListRefunds { .. } => ActionKind::ListRefunds,
            Self::TrackUsage(_) => ActionKind::TrackUsage,
            Self::TrackAiUsage(_) => ActionKind::TrackAiUsage,
            Self::GetUsageMetrics { .. } => ActionKind::GetUsageMetrics,
            Self::GetAiUsageMetrics { .. } => ActionKind::GetAiUsageMetrics,
        }
    }

    /// Invoke the matching client method and serialize its envelope.
    pub async fn dispatch(self, client: &dyn PaymentsClient) -> Result<Value> {
        match self {
            Self::CreateCustomer(request) => envelope(client.create_customer(request).await),
            Self::GetCustomer { id } => envelope(client.get_customer(&id).await),
            Self::UpdateCustomer { id, updates } => {
                envelope(client.update_customer(&id, updates).await)
            }
            Self::DeleteCustomer { id } => envelope(client.delete_customer(&id).await),
            Self::ListCustomers { request } => envelope(client.list_customers(request).await),

            Self::CreatePaymentIntent(params) => {
                envelope(client.create_payment_intent(params).await)
            }
            Self::GetPaymentIntent { id } => envelope(client.get_payment_intent(&id).await),
            Self::UpdatePaymentIntent { id, updates } => {
                envelope(client.update_payment_intent(&id, updates).await)
            }
            Self::CancelPaymentIntent { id } => envelope(client.cancel_payment_intent(&id).await),
            Self::ConfirmPaymentIntent {
                id,
                payment_method_id,
            } => envelope(
                client
                    .confirm_payment_intent(&id, payment_method_id.as_deref())
                    .await,
            ),
            Self::CapturePaymentIntent { id, amount } => {
                envelope(client.capture_payment_intent(&id, amount).await)
            }
            Self::ListPaymentIntents { request } => {
                envelope(client.list_payment_intents(request).await)
            }

            Self::CreateSubscription(params) => envelope(client.create_subscription(params).await),
            Self::GetSubscription { id } => envelope(client.get_subscription(&id).await),
            Self::UpdateSubscription { id, updates } => {
                envelope(client.update_subscription(&id, updates).await)
            }
            Self::CancelSubscription { id, immediately } => {
                envelope(client.cancel_subscription(&id, immediately).await)
            }
            Self::ListSubscriptions { request } => {
                envelope(client.list_subscriptions(request).await)
            }

            Self::CreateInvoice(params) => envelope(client.create_invoice(params).await),
            Self::GetInvoice { id } => envelope(client.get_invoice(&id).await),
            Self::UpdateInvoice { id, updates } => {
                envelope(client.update_invoice(&id, updates).await)
            }
            Self::FinalizeInvoice { id } => envelope(client.finalize_invoice(&id).await),
            Self::PayInvoice {
                id,
                payment_method_id,
            } => envelope(client.pay_invoice(&id, payment_method_id.as_deref()).await),
            Self::ListInvoices { request } => envelope(client.list_invoices(request).await),

            Self::CreateRefund(params) => envelope(client.create_refund(params).await),
            Self::GetRefund { id } => envelope(client.get_refund(&id).await),
            Self::ListRefunds { payment_id } => {
                envelope(client.list_refunds(payment_id.as_deref()).await)
            }

            Self::TrackUsage(params) => envelope(client.track_usage(params).await),
            Self::TrackAiUsage(params) => envelope(client.track_ai_usage(params).await),
            Self::GetUsageMetrics {
                customer_id,
                feature_id,
                period,
            } => envelope(
                client
                    .get_usage_metrics(&customer_id, &feature_id, &period)
                    .await,
            ),
            Self::GetAiUsageMetrics {
                customer_id,
                model_id,
                period,
            } => envelope(
                client
                    .get_ai_usage_metrics(&customer_id, model_id.as_deref(), period.as_deref())
                    .await,
            ),
        }
    }
}

fn envelope<T: Serialize>(response: Result<CarnilResponse<T>>) -> Result<Value> {
    Ok(serde_json::to_value(response?)?)
}
