//! Request/Response Types
//!
//! Shapes exchanged with the payments client. Customers are typed because the
//! UI hooks reason about them; every other resource is an opaque JSON object
//! owned by the client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form parameter object, forwarded untouched.
pub type Params = Map<String, Value>;

/// A resource whose shape is defined by the payments client.
pub type Resource = Value;

/// Uniform response envelope returned by every client method.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarnilResponse<T> {
    /// Payload on success
    pub data: Option<T>,

    /// Whether the provider accepted the operation
    pub success: bool,

    /// Provider error message on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Envelope fields added by the provider (request ids, codes)
    #[serde(flatten)]
    pub extra: Params,
}

impl<T> CarnilResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            success: true,
            error: None,
            extra: Params::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            data: None,
            success: false,
            error: Some(error.into()),
            extra: Params::new(),
        }
    }

    /// Successful response without payload (deletions).
    pub fn done() -> Self {
        Self {
            data: None,
            success: true,
            error: None,
            extra: Params::new(),
        }
    }

    /// Data of a successful response, `None` otherwise.
    pub fn into_success(self) -> Option<T> {
        if self.success { self.data } else { None }
    }
}

/// A customer record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Params>,

    /// Provider-specific fields, kept so pass-through is lossless
    #[serde(flatten)]
    pub extra: Params,
}

/// Parameters for `createCustomer`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Params>,

    #[serde(flatten)]
    pub extra: Params,
}

/// Parameters for `updateCustomer`. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Params>,

    #[serde(flatten)]
    pub extra: Params,
}

/// Pagination and filtering for `listCustomers`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Cursor: return records after this customer id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_after: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extra: Params,
}

/// One page of a list operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub data: Vec<T>,

    #[serde(default)]
    pub has_more: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,

    /// Provider list fields such as `object` or `url`
    #[serde(flatten)]
    pub extra: Params,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, has_more: bool, total_count: Option<u64>) -> Self {
        Self {
            data,
            has_more,
            total_count,
            extra: Params::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_shape() {
        let ok = serde_json::to_value(CarnilResponse::ok(1)).unwrap();
        assert_eq!(ok, json!({"data": 1, "success": true}));

        let failed = serde_json::to_value(CarnilResponse::<i32>::failure("nope")).unwrap();
        assert_eq!(failed, json!({"data": null, "success": false, "error": "nope"}));
    }

    #[test]
    fn test_customer_keeps_unknown_fields() {
        let raw = json!({"id": "cus_1", "email": "a@b.co", "livemode": false});
        let customer: Customer = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(customer.email.as_deref(), Some("a@b.co"));
        assert_eq!(customer.extra.get("livemode"), Some(&json!(false)));
        assert_eq!(serde_json::to_value(&customer).unwrap(), raw);
    }

    #[test]
    fn test_into_success_ignores_failed_payload() {
        let response = CarnilResponse {
            data: Some(3),
            success: false,
            error: None,
            extra: Params::new(),
        };
        assert_eq!(response.into_success(), None);
    }

    #[test]
    fn test_list_envelope_keeps_provider_fields() {
        let raw = json!({
            "data": {"data": [], "hasMore": false, "object": "list", "url": "/v1/customers"},
            "success": true,
            "requestId": "req_1",
        });
        let response: CarnilResponse<ListResponse<Resource>> =
            serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(response.extra.get("requestId"), Some(&json!("req_1")));
        assert_eq!(serde_json::to_value(&response).unwrap(), raw);
    }

    #[test]
    fn test_delete_envelope_accepts_any_payload() {
        let raw = json!({"data": {"id": "cus_1", "deleted": true}, "success": true});
        let response: CarnilResponse<Resource> = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&response).unwrap(), raw);

        let empty: CarnilResponse<Resource> =
            serde_json::from_value(json!({"data": null, "success": true})).unwrap();
        assert!(empty.success);
        assert_eq!(empty.data, None);
    }
}
