//! Caller Identification
//!
//! Adapters ask an [`Identify`] implementation who is calling before any
//! action is dispatched. It sees only the request headers, copied into a
//! framework-neutral [`RequestHeaders`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Identity of the calling customer
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub customer_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_data: Option<Value>,
}

impl Identity {
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            customer_data: None,
        }
    }

    /// No customer could be resolved
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.customer_data = Some(data);
        self
    }

    /// An empty customer id counts as missing
    pub fn is_identified(&self) -> bool {
        !self.customer_id.is_empty()
    }
}

/// Request headers with case-insensitive lookup
#[derive(Clone, Debug, Default)]
pub struct RequestHeaders {
    entries: HashMap<String, String>,
}

impl RequestHeaders {
    /// Build from name/value pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Header value if present and non-empty
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.trim().is_empty())
    }
}

impl From<&http::HeaderMap> for RequestHeaders {
    fn from(map: &http::HeaderMap) -> Self {
        Self::from_pairs(
            map.iter()
                .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?))),
        )
    }
}

/// Resolves the calling customer from a request
#[async_trait]
pub trait Identify: Send + Sync {
    async fn identify(&self, headers: &RequestHeaders) -> Result<Identity>;
}

/// Reads the customer id from a single request header
#[derive(Clone, Debug)]
pub struct HeaderIdentity {
    header: String,
}

impl HeaderIdentity {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }
}

impl Default for HeaderIdentity {
    fn default() -> Self {
        Self::new("x-customer-id")
    }
}

#[async_trait]
impl Identify for HeaderIdentity {
    async fn identify(&self, headers: &RequestHeaders) -> Result<Identity> {
        Ok(headers
            .non_empty(&self.header)
            .map_or_else(Identity::anonymous, |id| Identity::new(id.trim())))
    }
}

/// Adapts a synchronous closure
pub struct FnIdentify<F>(pub F);

#[async_trait]
impl<F> Identify for FnIdentify<F>
where
    F: Fn(&RequestHeaders) -> Result<Identity> + Send + Sync,
{
    async fn identify(&self, headers: &RequestHeaders) -> Result<Identity> {
        (self.0)(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let headers = RequestHeaders::from_pairs([("X-Customer-Id", "cus_1"), ("x-empty", " ")]);

        assert_eq!(headers.get("x-customer-id"), Some("cus_1"));
        assert_eq!(headers.get("X-CUSTOMER-ID"), Some("cus_1"));
        assert_eq!(headers.non_empty("x-empty"), None);
    }

    #[tokio::test]
    async fn test_header_identity() {
        let identify = HeaderIdentity::default();

        let found = identify
            .identify(&RequestHeaders::from_pairs([("x-customer-id", "cus_9")]))
            .await
            .unwrap();
        assert_eq!(found, Identity::new("cus_9"));

        let missing = identify.identify(&RequestHeaders::default()).await.unwrap();
        assert!(!missing.is_identified());
    }

    #[tokio::test]
    async fn test_fn_identify() {
        let identify = FnIdentify(|headers: &RequestHeaders| {
            Ok(Identity::new(headers.get("authorization").unwrap_or_default()))
        });

        let identity = identify
            .identify(&RequestHeaders::from_pairs([("authorization", "cus_auth")]))
            .await
            .unwrap();
        assert_eq!(identity.customer_id, "cus_auth");
    }
}
