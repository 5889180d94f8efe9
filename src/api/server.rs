//! HTTP server
//!
//! Sets up the axum router for the test email API and serves it until
//! Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::common::{DiagError, Result};
use crate::config::MailConfig;
use crate::mail::{transport_from_config, SharedTransport};
use crate::api::handlers;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MailConfig>,
    pub transport: SharedTransport,
}

impl AppState {
    pub fn new(config: MailConfig, transport: SharedTransport) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// State with the transport selected by the configured backend
    pub fn from_config(config: MailConfig) -> Result<Self> {
        let transport = transport_from_config(&config)?;
        Ok(Self::new(config, transport))
    }
}

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/send/", post(handlers::send_test_email))
        .route("/send-html/", post(handlers::send_html_email))
        .route("/config/", get(handlers::get_config))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `listen_addr` until Ctrl+C
pub async fn serve(listen_addr: SocketAddr, state: AppState) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    log::info!("Test email API listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DiagError::Other(format!("HTTP server error: {}", e)))?;

    log::info!("Test email API stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Received Ctrl+C, shutting down"),
        Err(e) => log::error!("Failed to listen for Ctrl+C: {}", e),
    }
}
