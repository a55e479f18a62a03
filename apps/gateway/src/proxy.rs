//! # Proxy Handler
//!
//! Forwards one inbound request to the backend and relays the answer.
//!
//! ## Forwarding Rules
//! ```text
//! inbound                               outbound
//! ───────                               ────────
//! METHOD /any/path?action=getItems  ──► METHOD <backend>?action=getItems
//!                                       (or <backend>&action=... when the
//!                                        backend URL already has a query)
//! Content-Type                      ──► Content-Type (unchanged)
//! body bytes                        ──► body bytes (unchanged)
//!
//! backend 2xx  ──► 200, same body, same Content-Type (default application/json)
//! backend !2xx ──► 502 {"error":"Proxy request failed","details":...}
//! no answer    ──► 502 {"error":"Proxy request failed","details":...}
//! ```
//!
//! Nothing is validated or rewritten; the gateway knows nothing about items.

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use tracing::debug;
use url::Url;

use crate::error::GatewayError;
use crate::GatewayState;

/// Appends the raw inbound query to the backend URL verbatim.
pub fn target_url(backend: &Url, raw_query: Option<&str>) -> String {
    let mut target = backend.to_string();

    if let Some(query) = raw_query.filter(|q| !q.is_empty()) {
        target.push(if backend.query().is_some() { '&' } else { '?' });
        target.push_str(query);
    }

    target
}

/// Fallback handler: every path except `/health` lands here.
pub async fn forward(
    State(state): State<GatewayState>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let target = target_url(&state.backend_url, query.as_deref());
    debug!(%method, %target, body_len = body.len(), "Forwarding request");

    let mut request = state.client.request(method, &target);
    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        request = request.header(CONTENT_TYPE, content_type.clone());
    }
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = request.send().await?;
    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let payload = upstream.bytes().await?;

    if !status.is_success() {
        return Err(GatewayError::UpstreamStatus {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&payload).into_owned(),
        });
    }

    debug!(status = status.as_u16(), bytes = payload.len(), "Relaying response");
    let content_type =
        content_type.unwrap_or_else(|| HeaderValue::from_static("application/json"));

    Ok(([(CONTENT_TYPE, content_type)], payload).into_response())
}
