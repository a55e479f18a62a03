//! # ScanStock Gateway
//!
//! Stateless HTTP proxy between scanning stations and the backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Gateway Router                                │
//! │                                                                         │
//! │   CorsLayer::permissive   (outermost: every response, errors included)  │
//! │     └── TraceLayer        (one span per request)                        │
//! │           ├── GET /health ──► "OK"                                      │
//! │           └── fallback    ──► proxy::forward ──► backend                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `BACKEND_URL` - The backend every request is forwarded to (required)
//! - `GATEWAY_BIND_ADDR` - Interface to listen on (default: 0.0.0.0)
//! - `GATEWAY_PORT` - HTTP port (default: 8888)
//! - `UPSTREAM_TIMEOUT_SECS` - Upstream deadline (default: 30)

pub mod config;
pub mod error;
pub mod proxy;

use axum::routing::get;
use axum::Router;
use reqwest::Client;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use url::Url;

// Re-exports
pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;

/// Shared state for the proxy handler.
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub client: Client,
    pub backend_url: Url,
}

impl GatewayState {
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            backend_url: config.backend_url.clone(),
        })
    }
}

/// Builds the gateway application.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(proxy::forward)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> &'static str {
    "OK"
}
