//! # Validation Module
//!
//! Input validation utilities for ScanStock.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end (web scanner / station prompt)                     │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + workflow state machine                         │
//! │  ├── Barcode / quantity / threshold checks                             │
//! │  └── Stock invariants (no request is built on failure)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Whatever the backend enforces; the gateway validates nothing      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use scanstock_core::validation::{parse_quantity, validate_barcode};
//!
//! assert_eq!(validate_barcode("  12345 ").unwrap(), "12345");
//! assert_eq!(parse_quantity("3").unwrap(), 3);
//! assert!(parse_quantity("0").is_err());
//! ```

use crate::error::ValidationError;
use crate::MAX_BARCODE_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a scanned or typed barcode.
///
/// ## Rules
/// - Surrounding whitespace is stripped (scanners often append a newline)
/// - Must not be empty
/// - Must be at most [`MAX_BARCODE_LEN`] characters
///
/// ## Returns
/// The trimmed barcode.
pub fn validate_barcode(barcode: &str) -> ValidationResult<String> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.chars().count() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    Ok(barcode.to_string())
}

/// Validates the operator name stamped on transactions.
pub fn validate_user(user: &str) -> ValidationResult<String> {
    let user = user.trim();

    if user.is_empty() {
        return Err(ValidationError::Required {
            field: "user".to_string(),
        });
    }

    if user.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "user".to_string(),
            max: 100,
        });
    }

    Ok(user.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a transaction quantity.
///
/// ## Rules
/// - Must be positive (> 0); zero and negatives are rejected for every kind
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Operator enters quantity: 0                                           │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → InvalidQuantity, state unchanged                 │
/// │       │                                                                 │
/// │       └── OK → QuantityEntered                                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<i64> {
    if qty <= 0 {
        return Err(ValidationError::InvalidQuantity {
            input: qty.to_string(),
        });
    }

    Ok(qty)
}

/// Parses a quantity typed by the operator.
///
/// Anything that is not a whole number fails the same way a non-positive
/// number does.
pub fn parse_quantity(input: &str) -> ValidationResult<i64> {
    let trimmed = input.trim();
    let qty = trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidQuantity {
            input: trimmed.to_string(),
        })?;

    validate_quantity(qty)
}

/// Validates a reorder threshold.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero means "never warn"
pub fn validate_min_stock(min_stock: i64) -> ValidationResult<i64> {
    if min_stock < 0 {
        return Err(ValidationError::Negative {
            field: "minStock".to_string(),
        });
    }

    Ok(min_stock)
}

// =============================================================================
// Unit Tests
// =============================================================================
