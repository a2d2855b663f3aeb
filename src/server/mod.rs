//! HTTP server
//!
//! - `POST /api/chat`: relay a conversation (SSE, or one JSON body when
//!   `stream` is `false`)
//! - `GET /health`: liveness

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::relay::Relay;

pub mod handlers;
pub mod sse;

pub use sse::{SseOptions, to_sse_response};

/// Shared handler state
#[derive(Clone, Debug)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub sse: SseOptions,
}

impl AppState {
    pub fn new(relay: Relay, sse: SseOptions) -> Self {
        Self {
            relay: Arc::new(relay),
            sse,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        Ok(Self::new(
            Relay::from_config(config)?,
            SseOptions::from_config(config),
        ))
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.bind_addr` and serve until Ctrl-C.
pub async fn serve(config: RelayConfig) -> Result<(), RelayError> {
    let state = AppState::from_config(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| {
            RelayError::ConfigurationError(format!("failed to bind {}: {e}", config.bind_addr))
        })?;

    tracing::info!(
        addr = %config.bind_addr,
        upstream = %config.base_url,
        model = %config.model,
        "chat relay listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RelayError::HttpError(format!("server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
