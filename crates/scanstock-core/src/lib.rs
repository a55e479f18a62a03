//! # scanstock-core: Pure Inventory Logic for ScanStock
//!
//! This crate is the **heart** of ScanStock. It owns the domain types and
//! every rule a stock movement must satisfy before it may leave the device.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ScanStock Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Station / Web Scanner (front ends)                 │   │
//! │  │    Scan ──► Item Details ──► Quantity ──► Confirm ──► Saved     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ scanstock-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────────────────┐     │   │
//! │  │   │   types   │  │ validation │  │       workflow        │     │   │
//! │  │   │   Item    │  │  quantity  │  │  TransactionValidator │     │   │
//! │  │   │Transaction│  │  barcode   │  │  (state machine)      │     │   │
//! │  │   └───────────┘  └────────────┘  └───────────────────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CAMERA • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              scanstock-client (Network Layer)                   │   │
//! │  │        resolver, submitter, retry policy, barcode source        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Transaction, LastRecord, etc.)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`workflow`] - The transaction validator state machine
//!
//! ## Example Usage
//!
//! ```rust
//! use scanstock_core::{Item, Lookup, TransactionKind, TransactionValidator, Validation};
//!
//! let item = Item::new("12345", "Bolt M8", 10, 5);
//! let mut flow = TransactionValidator::new(TransactionKind::Defect, "WebUser");
//!
//! flow.load(Lookup::Found(item)).unwrap();
//! flow.enter_quantity(3).unwrap();
//!
//! // 10 - 3 = 7 stays above the reorder threshold of 5
//! assert_eq!(flow.validate().unwrap(), Validation::Ready);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;
pub mod workflow;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;
pub use workflow::{FlowState, LoadedItem, Submission, TransactionValidator, Validation};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// User name recorded on transactions when the operator has not set one.
pub const DEFAULT_USER: &str = "WebUser";

/// Maximum accepted barcode length.
///
/// Longer inputs are almost always a scanner firing twice into the same field.
pub const MAX_BARCODE_LEN: usize = 128;
