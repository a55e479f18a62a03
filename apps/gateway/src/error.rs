//! Error types for the gateway.
//!
//! Every failure to reach the backend, or any non-2xx answer from it, is
//! reported to the caller the same way:
//!
//! ```text
//! HTTP/1.1 502 Bad Gateway
//! Content-Type: application/json
//! Access-Control-Allow-Origin: *
//!
//! {"error":"Proxy request failed","details":"<what went wrong>"}
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

/// Gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream responded with HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let details = self.to_string();
        warn!(%details, "Proxy request failed");

        (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "Proxy request failed",
                "details": details,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = GatewayError::UpstreamStatus {
            status: 500,
            body: "boom".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Proxy request failed");
        assert_eq!(body["details"], "Upstream responded with HTTP 500: boom");
    }
}
