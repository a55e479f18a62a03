//! # Station Error Type
//!
//! Unified error type for station commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Station                            │
//! │                                                                         │
//! │  Command                         Operator sees                          │
//! │  ───────                         ─────────────                          │
//! │                                                                         │
//! │  ClientError::Core(..)      ──►  [InsufficientStock] Insufficient ...   │
//! │  ClientError::Timeout(..)   ──►  [Timeout] Request timed out ...        │
//! │  ClientError::Http{502,..}  ──►  [Backend] Backend returned HTTP 502    │
//! │  ScanError::DeviceBusy      ──►  [Scanner] Capture device is busy       │
//! │  io::Error                  ──►  [Terminal] ...                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors scoped to one barcode are printed and the loop moves on; only
//! `Config` and `Terminal` errors end a command.

use scanstock_client::{ClientError, ScanError};
use scanstock_core::CoreError;

/// Result alias for station commands.
pub type StationResult<T> = Result<T, StationError>;

/// Error returned from station commands.
#[derive(Debug, Clone)]
pub struct StationError {
    /// Category shown in brackets before the message
    pub code: ErrorCode,

    /// Human-readable message for the operator
    pub message: String,
}

/// Error categories shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Barcode unknown where an existing item is required
    NotFound,

    /// Operator input rejected before any request
    ValidationError,

    /// Withdrawal larger than the stock on hand
    InsufficientStock,

    /// Station configuration unusable
    Config,

    /// Gateway unreachable after every retry
    Network,

    /// Request exceeded its deadline
    Timeout,

    /// Gateway or backend answered with an error
    Backend,

    /// Barcode source failure
    Scanner,

    /// Reading or writing the terminal failed
    Terminal,

    /// Anything else
    Internal,
}

impl StationError {
    /// Creates a new station error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        StationError {
            code,
            message: message.into(),
        }
    }

    /// The terminal went away (EOF on a required answer).
    pub fn input_closed() -> Self {
        StationError::new(ErrorCode::Terminal, "Input closed")
    }

    /// Returns true if the command cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self.code, ErrorCode::Config | ErrorCode::Terminal)
    }
}

/// Converts core errors to station errors.
impl From<CoreError> for StationError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ItemNotInStock { .. } => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::Validation(_)
            | CoreError::MinStockLocked { .. }
            | CoreError::StockOutOfRange { .. } => ErrorCode::ValidationError,
            CoreError::SubmitInFlight | CoreError::InvalidState { .. } => ErrorCode::Internal,
        };
        StationError::new(code, err.to_string())
    }
}

/// Converts client errors to station errors.
impl From<ClientError> for StationError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Core(core) => core.into(),
            ClientError::InvalidConfig(_)
            | ClientError::InvalidUrl(_)
            | ClientError::ConfigLoadFailed(_)
            | ClientError::ConfigSaveFailed(_) => StationError::new(ErrorCode::Config, err.to_string()),
            ClientError::ConnectionFailed(_) | ClientError::ExhaustedRetries { .. } => {
                StationError::new(ErrorCode::Network, err.to_string())
            }
            ClientError::Timeout(_) => StationError::new(ErrorCode::Timeout, err.to_string()),
            ClientError::Http { .. }
            | ClientError::BackendError(_)
            | ClientError::InvalidResponse(_) => {
                StationError::new(ErrorCode::Backend, err.to_string())
            }
        }
    }
}

/// Converts barcode source errors to station errors.
impl From<ScanError> for StationError {
    fn from(err: ScanError) -> Self {
        StationError::new(ErrorCode::Scanner, err.to_string())
    }
}

impl From<std::io::Error> for StationError {
    fn from(err: std::io::Error) -> Self {
        StationError::new(ErrorCode::Terminal, err.to_string())
    }
}

impl std::fmt::Display for StationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for StationError {}
