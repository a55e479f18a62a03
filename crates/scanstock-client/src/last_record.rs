//! # Last Record Cache
//!
//! Holds the most recently committed transaction for display.
//!
//! ```text
//!  submit ok ──► refresh() ──► GET ?action=getLastTransaction
//!                   │
//!                   ├── Ok(Some) → current() = that transaction + refresh time
//!                   ├── Ok(None) → current() = None (backend log is empty)
//!                   └── Err      → current() keeps the previous value
//! ```
//!
//! The value is whatever the backend last said. It can be stale between
//! refreshes and never pretends otherwise.

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use scanstock_core::LastRecord;

use crate::error::ClientResult;
use crate::http::Backend;
use crate::protocol::{decode_last_transaction, ReadAction};
use crate::requester::ResilientRequester;

/// Cache of the backend's last transaction.
pub struct LastRecordCache {
    backend: Arc<dyn Backend>,
    requester: ResilientRequester,
    current: Option<LastRecord>,
}

impl LastRecordCache {
    pub fn new(backend: Arc<dyn Backend>, requester: ResilientRequester) -> Self {
        Self {
            backend,
            requester,
            current: None,
        }
    }

    /// The last value successfully refreshed.
    pub fn current(&self) -> Option<&LastRecord> {
        self.current.as_ref()
    }

    /// Re-reads the last transaction from the backend.
    pub async fn refresh(&mut self) -> ClientResult<Option<LastRecord>> {
        let query = [("action", ReadAction::GetLastTransaction.as_str())];
        let backend = &self.backend;

        let body = self
            .requester
            .run(ReadAction::GetLastTransaction.as_str(), || backend.get(&query))
            .await
            .into_result()?;

        let record = decode_last_transaction(&body)?.map(|transaction| LastRecord {
            transaction,
            refreshed_at: Utc::now(),
        });

        debug!(
            barcode = record.as_ref().map(|r| r.transaction.item_barcode.as_str()),
            "Last record refreshed"
        );
        self.current = record.clone();
        Ok(record)
    }
}
