//! # carnil-web
//!
//! Leptos bindings for Carnil payments.
//!
//! - [`CarnilProvider`] health-checks a payments client and gates its
//!   children on the result.
//! - [`use_customer`] and [`use_customer_list`] mirror customer operations
//!   into reactive [`CustomerState`].
//!
//! Hooks take the client explicitly:
//!
//! ```ignore
//! let client = use_carnil()?;
//! let customers = use_customer_list(client, None);
//! let count = move || customers.state().get().customers.len();
//! ```
//!
//! Built as a `cdylib`, the crate also ships a small customer admin app.

mod api;
mod app;
mod components;
mod error;
mod hooks;
mod pages;
mod provider;
mod state;

pub use app::App;
pub use error::WebError;
pub use hooks::{CustomerHandle, use_customer, use_customer_list};
pub use provider::{
    CarnilContext, CarnilProvider, ProviderStatus, initialize, use_carnil, use_carnil_context,
};
pub use state::{CustomerState, StateCell, View};

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
