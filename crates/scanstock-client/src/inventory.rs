//! # Inventory Queries
//!
//! Read-only listings for the dashboard: every item, the most recent
//! transactions newest first, and a summary of both.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use scanstock_core::{Item, Transaction, TransactionKind};

use crate::error::ClientResult;
use crate::http::Backend;
use crate::protocol::{decode_items, decode_transactions, ReadAction};
use crate::requester::ResilientRequester;

/// How many transactions the dashboard shows by default.
pub const DEFAULT_RECENT_LIMIT: usize = 8;

/// How many items the summary ranks.
pub const TOP_ITEMS: usize = 5;

// =============================================================================
// Summary
// =============================================================================

/// Dashboard figures computed from one read of items and transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySummary {
    pub total_items: usize,
    pub below_min_stock: usize,
    /// Stock-in transactions stamped on `today` (UTC).
    pub stock_in_today: usize,
    /// Up to [`TOP_ITEMS`] items with the most stock, ties in backend order.
    pub top_items: Vec<Item>,
}

impl InventorySummary {
    /// Computes the summary. Transactions without a timestamp never count
    /// as today's.
    pub fn compute(items: &[Item], transactions: &[Transaction], today: NaiveDate) -> Self {
        let stock_in_today = transactions
            .iter()
            .filter(|tx| tx.kind == TransactionKind::In)
            .filter(|tx| tx.timestamp.is_some_and(|ts| ts.date_naive() == today))
            .count();

        let mut top_items = items.to_vec();
        top_items.sort_by(|a, b| b.stock.cmp(&a.stock));
        top_items.truncate(TOP_ITEMS);

        InventorySummary {
            total_items: items.len(),
            below_min_stock: items.iter().filter(|item| item.is_below_min_stock()).count(),
            stock_in_today,
            top_items,
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Listing queries against the backend.
#[derive(Clone)]
pub struct InventoryQueries {
    backend: Arc<dyn Backend>,
    requester: ResilientRequester,
}

impl InventoryQueries {
    pub fn new(backend: Arc<dyn Backend>, requester: ResilientRequester) -> Self {
        Self { backend, requester }
    }

    /// Every item the backend knows about.
    pub async fn list_items(&self) -> ClientResult<Vec<Item>> {
        let query = [("action", ReadAction::GetItems.as_str())];
        let body = self
            .requester
            .run(ReadAction::GetItems.as_str(), || self.backend.get(&query))
            .await
            .into_result()?;

        let items = decode_items(&body)?;
        debug!(count = items.len(), "Items listed");
        Ok(items)
    }

    /// The whole transaction log, oldest first.
    pub async fn transactions(&self) -> ClientResult<Vec<Transaction>> {
        let query = [("action", ReadAction::GetTransactions.as_str())];
        let body = self
            .requester
            .run(ReadAction::GetTransactions.as_str(), || self.backend.get(&query))
            .await
            .into_result()?;

        decode_transactions(&body)
    }

    /// The last `limit` transactions, newest first.
    ///
    /// The backend returns its log oldest first; the tail is taken and
    /// reversed.
    pub async fn recent_transactions(&self, limit: usize) -> ClientResult<Vec<Transaction>> {
        let mut transactions = self.transactions().await?;
        let skip = transactions.len().saturating_sub(limit);
        transactions.drain(..skip);
        transactions.reverse();

        debug!(count = transactions.len(), limit, "Recent transactions listed");
        Ok(transactions)
    }

    /// Reads items, then transactions, and summarizes them for `today`.
    pub async fn summary(&self, today: NaiveDate) -> ClientResult<InventorySummary> {
        let items = self.list_items().await?;
        let transactions = self.transactions().await?;
        let summary = InventorySummary::compute(&items, &transactions, today);

        debug!(
            total_items = summary.total_items,
            stock_in_today = summary.stock_in_today,
            "Inventory summarized"
        );
        Ok(summary)
    }
}
