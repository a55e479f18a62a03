//! # Error Types
//!
//! Domain-specific error types for scanstock-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  scanstock-core errors (this file)                                     │
//! │  ├── CoreError        - Stock rules and state machine misuse           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  scanstock-client errors (separate crate)                              │
//! │  └── ClientError      - Transport, timeout, backend failures           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → operator message    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these errors ever reach the network: they are raised before a
//! request is built.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Barcode is unknown to the backend on a stock-out or defect flow.
    ///
    /// Stock-in treats the same lookup result as "create a new item"; the
    /// withdrawal flows cannot remove stock that was never recorded.
    #[error("Item {barcode} is not in stock")]
    ItemNotInStock { barcode: String },

    /// Withdrawal would take stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan 12345 (stock: 3)
    ///      │
    ///      ▼
    /// Enter quantity: 5
    ///      │
    ///      ▼
    /// InsufficientStock { barcode: "12345", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Operator sees: "Only 3 of 12345 in stock"   (no request was sent)
    /// ```
    #[error("Insufficient stock for {barcode}: available {available}, requested {requested}")]
    InsufficientStock {
        barcode: String,
        available: i64,
        requested: i64,
    },

    /// The movement would push stock past what can be counted.
    #[error("Quantity {quantity} is out of range for {barcode} (stock {stock})")]
    StockOutOfRange {
        barcode: String,
        stock: i64,
        quantity: i64,
    },

    /// Item fields other than stock belong to the backend once the item exists.
    #[error("Item {barcode} already exists; its details are managed by the backend")]
    MinStockLocked { barcode: String },

    /// A submission is already pending for this validator.
    #[error("A submission is already in progress")]
    SubmitInFlight,

    /// Operation is not valid in the validator's current state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true if the error came from bad operator input rather than state.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_)
                | CoreError::InsufficientStock { .. }
                | CoreError::StockOutOfRange { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Quantity is not a positive whole number.
    #[error("Quantity must be a positive whole number, got '{input}'")]
    InvalidQuantity { input: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
