//! API Client
//!
//! Builds the [`RemoteClient`] the UI talks to: the action endpoint on the
//! page's own origin, identified by the customer id kept in local storage.

use std::sync::Arc;

use carnil_core::{RemoteClient, SharedClient};

use crate::error::WebError;

/// Local storage key holding the signed-in customer id
pub const CUSTOMER_KEY: &str = "carnil_customer";

/// Header the adapters read the customer id from
pub const IDENTITY_HEADER: &str = "x-customer-id";

/// Action endpoint on the current origin
pub fn endpoint() -> String {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_else(|| "http://localhost:3000".into());
    format!("{origin}/api/carnil")
}

/// Customer id saved for this browser, if any
pub fn session_customer() -> Option<String> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|storage| storage.get_item(CUSTOMER_KEY).ok().flatten())
        .filter(|id| !id.is_empty())
}

pub fn remember_customer(id: &str) {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(CUSTOMER_KEY, id);
    }
}

/// Client for `endpoint()`, sending `customer_id` as the caller identity.
pub fn remote_client(customer_id: Option<&str>) -> Result<SharedClient, WebError> {
    let mut client = RemoteClient::new(endpoint());
    if let Some(id) = customer_id {
        client = client.with_header(IDENTITY_HEADER, id)?;
    }
    Ok(Arc::new(client))
}
