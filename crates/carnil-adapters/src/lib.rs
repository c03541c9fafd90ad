//! # carnil-adapters
//!
//! Framework adapters for Carnil payments.
//!
//! The request flow is the same for every host framework:
//!
//! ```text
//! request ──▶ CORS headers ──▶ OPTIONS? ──yes──▶ 200 {}
//!                                 │no
//!                                 ▼
//!                            identify() ──empty──▶ 401
//!                                 │
//!                                 ▼
//!                          decode action ──unknown──▶ 400
//!                                 │
//!                                 ▼
//!                        client.<method>() ──error──▶ 500
//!                                 │
//!                                 ▼
//!                        200 {data, success, error?}
//! ```
//!
//! [`CarnilHandler`] and [`WebhookHandler`] implement that flow without any
//! framework types. The `axum` and `actix` features mount them as routes:
//!
//! | route | handler |
//! |---|---|
//! | `POST /api/carnil` | action dispatch |
//! | `POST /api/carnil/webhook` | webhook verification |
//! | `GET /api/carnil/health` | client health probe |
//! | `OPTIONS` on the first two | CORS preflight |

mod config;
mod cors;
mod error;
mod handler;
mod identity;
mod webhook;

#[cfg(feature = "actix")]
pub mod actix;
#[cfg(feature = "axum")]
pub mod axum;

pub use config::AdapterConfig;
pub use cors::{CorsHeaders, DEFAULT_CORS_HEADERS};
pub use error::{AdapterError, Result};
pub use handler::{CarnilHandler, Reply};
pub use identity::{FnIdentify, HeaderIdentity, Identify, Identity, RequestHeaders};
pub use webhook::{SIGNATURE_HEADERS, WebhookHandler, signature_from};

/// Action endpoint path
pub const ACTION_PATH: &str = "/api/carnil";

/// Webhook endpoint path
pub const WEBHOOK_PATH: &str = "/api/carnil/webhook";

/// Health endpoint path
pub const HEALTH_PATH: &str = "/api/carnil/health";
