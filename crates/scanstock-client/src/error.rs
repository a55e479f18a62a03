//! # Client Error Types
//!
//! Error types for everything that talks to the backend.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Http (non-2xx)         │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  BackendError (2xx body)│ │
//! │  │  ConfigLoad...  │  │  Exhausted...   │  │  InvalidResponse        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Retry classification (see is_transient):                              │
//! │  • ConnectionFailed, Http 5xx  → retried by ResilientRequester         │
//! │  • everything else             → surfaced immediately                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use scanstock_core::CoreError;
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering every failure between the station and the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid station configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid gateway URL.
    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the gateway, or the connection dropped mid-request.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request exceeded its deadline. Never retried.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Every attempt failed with a transient error.
    #[error("Gave up after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Non-2xx status from the gateway (502 when the backend itself failed).
    #[error("Backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// 2xx response whose body declares an error.
    #[error("Backend rejected the request: {0}")]
    BackendError(String),

    /// Body could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Rule or state machine violation raised before any request.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            ClientError::InvalidConfig(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ClientError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<scanstock_core::ValidationError> for ClientError {
    fn from(err: scanstock_core::ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl ClientError {
    /// Returns true if the failure may clear up on its own and the call can be retried.
    ///
    /// ## Transient
    /// - Connection failures
    /// - 5xx responses (the gateway answers 502 when the backend is down)
    ///
    /// ## Not Transient
    /// - Timeouts (a deadline abort is final)
    /// - 4xx, malformed bodies, backend-declared errors
    /// - Local validation failures
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::ConnectionFailed(_) => true,
            ClientError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if the error was raised locally, before any request.
    pub fn is_local(&self) -> bool {
        matches!(self, ClientError::Core(_))
    }
}
