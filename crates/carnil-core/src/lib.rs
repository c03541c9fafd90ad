//! # carnil-core
//!
//! The payments-client contract shared by every Carnil adapter.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   {action, ...params}   ┌──────────┐   method call   ┌────────────────┐
//! │ HTTP adapter │────────────────────────▶│  Action  │────────────────▶│ PaymentsClient │
//! │  / UI hook   │◀────────────────────────│ dispatch │◀────────────────│   (Strategy)   │
//! └──────────────┘   {data, success, error}└──────────┘   envelope      └────────────────┘
//! ```
//!
//! The real payments client (provider selection, metering, signature schemes)
//! lives outside this workspace. Adapters only ever talk to it through the
//! [`PaymentsClient`] trait, so any implementation can be injected:
//!
//! - [`RemoteClient`] forwards actions to a Carnil endpoint over HTTP.
//! - [`MemoryClient`] keeps everything in process (development and tests).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use carnil_core::{Action, MemoryClient, ClientConfig};
//!
//! let client = MemoryClient::new(ClientConfig::from_env());
//! let action = Action::from_body(r#"{"action":"getCustomer","id":"cus_1"}"#)?;
//! let envelope = action.dispatch(&client).await?;
//! ```

pub mod action;
pub mod client;
pub mod error;
pub mod signature;
pub mod types;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "remote")]
pub mod remote;

pub use action::{Action, ActionKind};
pub use client::{ClientConfig, PaymentsClient, ProviderConfig, SharedClient};
pub use error::{ActionError, CarnilError, Result};
pub use types::{
    CarnilResponse, CreateCustomerRequest, Customer, CustomerListRequest, ListResponse, Params,
    Resource, UpdateCustomerRequest,
};

#[cfg(feature = "memory")]
pub use memory::{CALL_LOG_CAPACITY, Fault, MemoryClient, RecordedCall};
#[cfg(feature = "remote")]
pub use remote::RemoteClient;
