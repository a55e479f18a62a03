//! # scanstock-client: Network Layer for ScanStock
//!
//! This crate owns every interaction with the backend behind the gateway,
//! plus the barcode source that starts each transaction.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 StockSession (per-operator orchestrator)         │  │
//! │  │   scan → resolve → validate → confirm → submit → refresh         │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  ItemResolver  │  │  Transaction-  │  │  LastRecordCache       │    │
//! │  │                │  │  Submitter     │  │  InventoryQueries      │    │
//! │  │ getItemBy-     │  │ addStockIn /   │  │ getLastTransaction /   │    │
//! │  │ Barcode        │  │ stockOut /     │  │ getItems /             │    │
//! │  │                │  │ defect         │  │ getTransactions        │    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          └───────────────────┼───────────────────────┘                 │
//! │                              ▼                                          │
//! │              ResilientRequester (deadline + fixed-delay retry)         │
//! │                              │                                          │
//! │                              ▼                                          │
//! │              dyn Backend ── HttpBackend (reqwest)                       │
//! │                                                                         │
//! │  BarcodeScanner: VideoDecoder or ManualEntry → ScanSession → codes     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Station configuration (gateway URL, retry policy, user)
//! - [`error`] - Client error types and retry classification
//! - [`http`] - `Backend` trait and the reqwest implementation
//! - [`protocol`] - Action names, write bodies, response normalization
//! - [`requester`] - Deadline and retry wrapper
//! - [`resolver`] - Barcode lookup
//! - [`submitter`] - Transaction submission
//! - [`last_record`] - Last committed transaction
//! - [`inventory`] - Item and transaction listings
//! - [`scanner`] - Barcode source
//! - [`session`] - The `StockSession` orchestrator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scanstock_client::{HttpBackend, ResilientRequester, StationConfig, StockSession};
//! use scanstock_core::TransactionKind;
//!
//! let config = StationConfig::load_or_default(None);
//! let backend = Arc::new(HttpBackend::from_config(&config)?);
//! let requester = ResilientRequester::new(config.retry_policy());
//!
//! let mut session = StockSession::new(TransactionKind::Out, config.user(), backend, requester);
//! session.scan("12345").await?;
//! session.enter_quantity(2)?;
//! session.validate()?;
//! let report = session.submit().await?;
//! println!("Stock is now {}", report.new_stock());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod http;
pub mod inventory;
pub mod last_record;
pub mod protocol;
pub mod requester;
pub mod resolver;
pub mod scanner;
pub mod session;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::StationConfig;
pub use error::{ClientError, ClientResult};
pub use http::{Backend, HttpBackend};
pub use inventory::{InventoryQueries, InventorySummary, DEFAULT_RECENT_LIMIT, TOP_ITEMS};
pub use last_record::LastRecordCache;
pub use protocol::CommitAck;
pub use requester::{RequestOutcome, ResilientRequester, RetryPolicy};
pub use resolver::ItemResolver;
pub use scanner::{
    BarcodeScanner, ManualEntry, ScanError, ScanResult, ScanSession, ScanStatus, VideoDecoder,
};
pub use session::{StockSession, SubmitReport};
pub use submitter::TransactionSubmitter;
