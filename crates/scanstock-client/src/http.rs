//! # Backend Transport
//!
//! The one seam between the pipeline and the network.
//!
//! ```text
//! Resolver / Submitter / Queries
//!            │
//!            ▼
//!   dyn Backend ──── HttpBackend (reqwest → gateway → backend)
//!            │
//!            └────── scripted backends in tests
//! ```
//!
//! A backend speaks the action-dispatch protocol: reads are `GET ?action=…`,
//! writes are `POST {action, …}`. Bodies come back as raw JSON; making sense
//! of them is [`crate::protocol`]'s job.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::StationConfig;
use crate::error::{ClientError, ClientResult};

// =============================================================================
// Backend Trait
// =============================================================================

/// A single attempt at talking to the backend.
///
/// Implementations make exactly one request per call. Deadlines and retries
/// are layered on top by [`crate::requester::ResilientRequester`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Issues a read with the given query pairs.
    async fn get(&self, query: &[(&str, &str)]) -> ClientResult<Value>;

    /// Issues a write with a JSON body.
    async fn post(&self, body: &Value) -> ClientResult<Value>;
}

// =============================================================================
// HTTP Backend
// =============================================================================

/// Backend reached over HTTP through the gateway.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    url: Url,
}

impl HttpBackend {
    /// Creates a backend for the gateway at `url`.
    ///
    /// `connect_timeout` bounds the TCP handshake only; the per-attempt
    /// deadline belongs to the requester.
    pub fn new(url: Url, connect_timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("scanstock/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("HTTP client: {}", e)))?;

        debug!(%url, ?connect_timeout, "HTTP backend created");
        Ok(Self { client, url })
    }

    /// Creates a backend from the station config.
    pub fn from_config(config: &StationConfig) -> ClientResult<Self> {
        Self::new(config.gateway_url()?, config.connect_timeout())
    }

    /// Gateway URL requests are sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Turns a response into JSON, or into an error for non-2xx statuses.
    async fn handle_response(response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Backend request failed");
            return Err(ClientError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(parse_body(&text))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get(&self, query: &[(&str, &str)]) -> ClientResult<Value> {
        debug!(url = %self.url, ?query, "GET");
        let response = self.client.get(self.url.clone()).query(query).send().await?;
        Self::handle_response(response).await
    }

    async fn post(&self, body: &Value) -> ClientResult<Value> {
        debug!(url = %self.url, action = ?body.get("action"), "POST");
        let response = self.client.post(self.url.clone()).json(body).send().await?;
        Self::handle_response(response).await
    }
}

/// Parses a response body.
///
/// Empty bodies become `null` and bodies that are not JSON are kept as a JSON
/// string, since some backend variants answer lookups with plain text.
pub(crate) fn parse_body(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}
