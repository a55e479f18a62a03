//! # Domain Types
//!
//! Core domain types used throughout ScanStock.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │   Transaction   │   │   LastRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  barcode (key)  │   │  item_barcode   │   │  transaction    │       │
//! │  │  name, type     │   │  kind           │   │  refreshed_at   │       │
//! │  │  category       │   │  quantity       │   └─────────────────┘       │
//! │  │  min_stock      │   │  user           │                             │
//! │  │  stock          │   │  timestamp      │   ┌─────────────────┐       │
//! │  └─────────────────┘   └─────────────────┘   │ TransactionKind │       │
//! │                                              │  In / Out /     │       │
//! │  ┌─────────────────┐                         │  Defect         │       │
//! │  │   ItemDraft     │  unseen barcode on      └─────────────────┘       │
//! │  │  (stock-in)     │  the stock-in path                                │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! The barcode is the only key. The backend owns the append-only transaction
//! log; nothing here carries a surrogate id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

// =============================================================================
// Item
// =============================================================================

/// An inventory item as known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Barcode - the unique identity key.
    pub barcode: String,

    /// Display name.
    pub name: String,

    /// Free-form item type.
    #[serde(rename = "type")]
    pub item_type: String,

    /// Free-form category.
    pub category: String,

    /// Reorder threshold. Advisory only.
    pub min_stock: i64,

    /// Current quantity on hand.
    pub stock: i64,
}

impl Item {
    /// Creates an item with empty type and category.
    pub fn new(barcode: impl Into<String>, name: impl Into<String>, stock: i64, min_stock: i64) -> Self {
        Item {
            barcode: barcode.into(),
            name: name.into(),
            item_type: String::new(),
            category: String::new(),
            min_stock,
            stock,
        }
    }

    /// Checks if current stock is under the reorder threshold.
    #[inline]
    pub fn is_below_min_stock(&self) -> bool {
        self.stock < self.min_stock
    }
}

// =============================================================================
// Item Draft
// =============================================================================

/// Editable record for a barcode the backend has never seen.
///
/// Only reachable on the stock-in path. Every field except the barcode may be
/// edited until the first stock-in commits; after that the backend owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub barcode: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub category: String,
    /// Unset until the operator chooses a threshold.
    pub min_stock: Option<i64>,
}

impl ItemDraft {
    /// Creates an empty draft for a barcode.
    pub fn new(barcode: impl Into<String>) -> Self {
        ItemDraft {
            barcode: barcode.into(),
            name: String::new(),
            item_type: String::new(),
            category: String::new(),
            min_stock: None,
        }
    }

    /// Name sent to the backend: the barcode stands in for an empty name.
    pub fn effective_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.barcode
        } else {
            self.name.trim()
        }
    }

    /// Materializes the draft as an item holding `stock` units.
    pub fn into_item(self, stock: i64) -> Item {
        Item {
            name: self.effective_name().to_string(),
            min_stock: self.min_stock.unwrap_or(0),
            barcode: self.barcode,
            item_type: self.item_type,
            category: self.category,
            stock,
        }
    }
}

/// Field edits applied to a draft. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftEdit {
    pub name: Option<String>,
    pub item_type: Option<String>,
    pub category: Option<String>,
    pub min_stock: Option<i64>,
}

// =============================================================================
// Transaction Kind
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Goods received; increases stock.
    In,
    /// Goods issued; decreases stock.
    Out,
    /// Goods written off as defective; decreases stock.
    Defect,
}

impl TransactionKind {
    /// Action name the backend dispatches writes on.
    pub const fn action(&self) -> &'static str {
        match self {
            TransactionKind::In => "addStockIn",
            TransactionKind::Out => "stockOut",
            TransactionKind::Defect => "defect",
        }
    }

    /// Returns true for kinds that take stock away.
    #[inline]
    pub const fn is_withdrawal(&self) -> bool {
        matches!(self, TransactionKind::Out | TransactionKind::Defect)
    }

    /// Stock level after applying `quantity` of this kind.
    ///
    /// `None` when the result does not fit in an `i64`.
    #[inline]
    pub const fn apply(&self, stock: i64, quantity: i64) -> Option<i64> {
        if self.is_withdrawal() {
            stock.checked_sub(quantity)
        } else {
            stock.checked_add(quantity)
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::In => write!(f, "in"),
            TransactionKind::Out => write!(f, "out"),
            TransactionKind::Defect => write!(f, "defect"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    /// Accepts the canonical names plus the action names seen in backend logs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_' && *c != ' ')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "in" | "stockin" | "addstockin" => Ok(TransactionKind::In),
            "out" | "stockout" => Ok(TransactionKind::Out),
            "defect" | "defects" => Ok(TransactionKind::Defect),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A committed (or about to be committed) stock movement.
///
/// Immutable once created; the backend appends it to its log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub item_barcode: String,
    pub kind: TransactionKind,
    /// Always > 0.
    pub quantity: i64,
    pub user: String,
    #[ts(as = "Option<String>")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Item name as recorded in the backend log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    /// Free text, used for defect descriptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// =============================================================================
// Last Record
// =============================================================================

/// The most recently committed transaction, as last read from the backend.
///
/// May be stale between refreshes; it never claims to be live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LastRecord {
    pub transaction: Transaction,
    #[ts(as = "String")]
    pub refreshed_at: DateTime<Utc>,
}

// =============================================================================
// Lookup Result
// =============================================================================

/// Outcome of resolving a barcode. `NotFound` is a valid answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Item),
    NotFound { barcode: String },
}

impl Lookup {
    /// Returns the barcode that was looked up.
    pub fn barcode(&self) -> &str {
        match self {
            Lookup::Found(item) => &item.barcode,
            Lookup::NotFound { barcode } => barcode,
        }
    }

    /// Returns true if the backend had no record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Lookup::NotFound { .. })
    }
}

// =============================================================================
// Min Stock Warning
// =============================================================================

/// Non-blocking warning: the movement would leave stock under the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BelowMinStockWarning {
    pub barcode: String,
    pub resulting_stock: i64,
    pub min_stock: i64,
}

impl fmt::Display for BelowMinStockWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stock of {} will drop to {}, below the minimum of {}",
            self.barcode, self.resulting_stock, self.min_stock
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
