//! Test email HTTP API
//!
//! This module exposes the mail sender over HTTP:
//! - `POST /send/` sends a plain-text test email
//! - `POST /send-html/` sends an HTML test email
//! - `GET /config/` reports the mail settings without secrets
//! - `GET /health` liveness probe
//!
//! Deliveries run on tokio's blocking thread pool; the configuration is
//! shared immutably between requests.

pub mod error;
pub mod handlers;
pub mod server;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use server::{AppState, build_router, serve};
pub use types::{ConfigResponse, ErrorResponse, SendHtmlRequest, SendRequest, SendResponse};
