//! Plain-text rendering of items, transactions and reports.

use scanstock_client::{InventorySummary, SubmitReport};
use scanstock_core::{Item, LastRecord, LoadedItem, Transaction};

/// One-line item summary, flagged when under its reorder threshold.
pub fn item_line(item: &Item) -> String {
    let mut line = format!(
        "{:<16} {:<28} stock {:>6}  min {:>5}",
        item.barcode, item.name, item.stock, item.min_stock
    );
    if item.is_below_min_stock() {
        line.push_str("  LOW");
    }
    line
}

/// What the operator sees right after a scan.
pub fn loaded_item(item: &LoadedItem) -> String {
    match item {
        LoadedItem::Known(item) => format!("Found: {}", item_line(item)),
        LoadedItem::New(draft) => format!("New item {}: not yet in inventory", draft.barcode),
    }
}

pub fn transaction_line(tx: &Transaction) -> String {
    let when = tx
        .timestamp
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let name = tx.item_name.as_deref().unwrap_or("");
    let barcode = if tx.item_barcode.is_empty() {
        "-"
    } else {
        tx.item_barcode.as_str()
    };

    let mut line = format!(
        "{:<16} {:<7} {:>6}  {:<16} {:<20} {}",
        when, tx.kind, tx.quantity, barcode, name, tx.user
    );
    if let Some(note) = &tx.note {
        line.push_str(&format!("  ({})", note));
    }
    line.trim_end().to_string()
}

pub fn last_record(record: Option<&LastRecord>) -> String {
    match record {
        Some(record) => format!(
            "Last record: {} (as of {})",
            transaction_line(&record.transaction),
            record.refreshed_at.format("%H:%M:%S")
        ),
        None => "Last record: none".to_string(),
    }
}

pub fn report(report: &SubmitReport) -> String {
    let mut text = format!(
        "Committed {} {} x {}. Stock is now {}.",
        report.transaction.kind,
        report.transaction.quantity,
        report.item.name,
        report.new_stock()
    );
    if let Some(message) = &report.ack.message {
        text.push_str(&format!(" Backend: {}", message));
    }
    text
}

/// Dashboard figures, one per line, followed by the top items.
pub fn summary(summary: &InventorySummary) -> Vec<String> {
    let mut lines = vec![
        format!("Total items:         {}", summary.total_items),
        format!("Below minimum stock: {}", summary.below_min_stock),
        format!("Stock-in today:      {}", summary.stock_in_today),
    ];
    if !summary.top_items.is_empty() {
        lines.push(format!("Top {} items by stock:", summary.top_items.len()));
        lines.extend(summary.top_items.iter().map(|item| format!("  {}", item_line(item))));
    }
    lines
}
