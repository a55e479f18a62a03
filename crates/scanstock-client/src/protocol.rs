//! # Backend Protocol
//!
//! Action names, request bodies, and normalization of whatever JSON the
//! backend sends back.
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Action Dispatch                                  │
//! │                                                                         │
//! │  Reads (GET, query string)                                             │
//! │    ?action=getItems                                                     │
//! │    ?action=getTransactions                                              │
//! │    ?action=getItemByBarcode&barcode=12345                               │
//! │    ?action=getLastTransaction                                           │
//! │                                                                         │
//! │  Writes (POST, JSON body)                                              │
//! │    { "action": "addStockIn" | "stockOut" | "defect",                    │
//! │      "barcode": "12345", "quantity": 3, "user": "WebUser",              │
//! │      "timestamp": "2024-05-01T09:30:00Z", ... }                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Normalization
//! Backend variants disagree on key names and casing (`minStock` vs
//! `min_stock`, `Timestamp` vs `timestamp`) and spreadsheet cells come back
//! as numbers or strings. Every key is looked up case-insensitively over a
//! list of candidate names, and integers are read from either form.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use scanstock_core::{Item, ItemDraft, Lookup, Transaction, TransactionKind};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Read Actions
// =============================================================================

/// Read actions the backend dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAction {
    GetItems,
    GetTransactions,
    GetItemByBarcode,
    GetLastTransaction,
}

impl ReadAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReadAction::GetItems => "getItems",
            ReadAction::GetTransactions => "getTransactions",
            ReadAction::GetItemByBarcode => "getItemByBarcode",
            ReadAction::GetLastTransaction => "getLastTransaction",
        }
    }
}

// =============================================================================
// Field Lookup
// =============================================================================

const ITEM_BARCODE: &[&str] = &["barcode"];
const ITEM_NAME: &[&str] = &["name", "itemName"];
const ITEM_TYPE: &[&str] = &["type", "itemType"];
const ITEM_CATEGORY: &[&str] = &["category"];
const ITEM_MIN_STOCK: &[&str] = &["minStock", "min_stock"];
const ITEM_STOCK: &[&str] = &["stock", "quantity", "currentStock"];

const TX_BARCODE: &[&str] = &["itemBarcode", "barcode"];
const TX_KIND: &[&str] = &["kind", "type", "action"];
const TX_QUANTITY: &[&str] = &["quantity", "qty"];
const TX_USER: &[&str] = &["user"];
const TX_TIMESTAMP: &[&str] = &["timestamp", "date"];
const TX_ITEM_NAME: &[&str] = &["itemName", "name"];
const TX_NOTE: &[&str] = &["note", "description"];

/// Finds the first non-null value whose key matches a candidate, ignoring ASCII case.
fn field<'a>(obj: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|candidate| {
        obj.iter()
            .find(|(key, value)| key.eq_ignore_ascii_case(candidate) && !value.is_null())
            .map(|(_, value)| value)
    })
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads an integer from a JSON number or a numeric string.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

fn text_field(obj: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    field(obj, candidates).and_then(text)
}

fn int_field(obj: &Map<String, Value>, candidates: &[&str]) -> Option<i64> {
    field(obj, candidates).and_then(integer)
}

/// Reads an RFC 3339 string or epoch milliseconds.
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Normalizes an item object. Returns `None` when there is no barcode.
pub fn parse_item(value: &Value) -> Option<Item> {
    let obj = value.as_object()?;
    let barcode = text_field(obj, ITEM_BARCODE).filter(|b| !b.is_empty())?;

    Some(Item {
        name: text_field(obj, ITEM_NAME).unwrap_or_default(),
        item_type: text_field(obj, ITEM_TYPE).unwrap_or_default(),
        category: text_field(obj, ITEM_CATEGORY).unwrap_or_default(),
        min_stock: int_field(obj, ITEM_MIN_STOCK).unwrap_or(0).max(0),
        stock: int_field(obj, ITEM_STOCK).unwrap_or(0),
        barcode,
    })
}

/// Normalizes a transaction object.
///
/// Needs a barcode or an item name, a recognizable kind and a quantity;
/// anything less is not a transaction. Spreadsheet logs name the item
/// (`ItemName`) without its barcode, in which case `item_barcode` is empty.
pub fn parse_transaction(value: &Value) -> Option<Transaction> {
    let obj = value.as_object()?;
    let item_barcode = text_field(obj, TX_BARCODE).filter(|b| !b.is_empty());
    let item_name = text_field(obj, TX_ITEM_NAME).filter(|n| !n.is_empty());
    if item_barcode.is_none() && item_name.is_none() {
        return None;
    }
    let kind = text_field(obj, TX_KIND)?.parse::<TransactionKind>().ok()?;
    let quantity = int_field(obj, TX_QUANTITY)?.checked_abs()?;

    Some(Transaction {
        item_barcode: item_barcode.unwrap_or_default(),
        kind,
        quantity,
        user: text_field(obj, TX_USER).unwrap_or_default(),
        timestamp: field(obj, TX_TIMESTAMP).and_then(timestamp),
        item_name,
        note: text_field(obj, TX_NOTE).filter(|n| !n.is_empty()),
    })
}

/// Interprets a `getItemByBarcode` body.
///
/// ## NotFound Shapes
/// `null`, `""`, `{}`, `[]`, and any object without a barcode all mean the
/// backend has no record. A non-empty array yields its first item. An object
/// declaring an error is a `BackendError`, never a miss.
pub fn decode_lookup(barcode: &str, body: &Value) -> ClientResult<Lookup> {
    let not_found = || Lookup::NotFound {
        barcode: barcode.to_string(),
    };

    let candidate = match body {
        Value::Null => return Ok(not_found()),
        Value::String(s) if s.trim().is_empty() => return Ok(not_found()),
        Value::Array(entries) => match entries.first() {
            Some(first) => first,
            None => return Ok(not_found()),
        },
        Value::Object(_) => {
            check_declared_error(body)?;
            body
        }
        other => {
            return Err(ClientError::InvalidResponse(format!(
                "unexpected lookup body: {}",
                other
            )))
        }
    };

    match parse_item(candidate) {
        Some(item) => Ok(Lookup::Found(item)),
        None => {
            debug!(barcode, "Lookup body has no barcode, treating as not found");
            Ok(not_found())
        }
    }
}

/// Unwraps list bodies. Accepts a bare array or an object wrapping one
/// under `items`, `transactions` or `data`.
fn entries<'a>(body: &'a Value, wrapper: &str) -> ClientResult<&'a [Value]> {
    match body {
        Value::Array(entries) => Ok(entries),
        Value::Null => Ok(&[]),
        Value::Object(obj) => match field(obj, &[wrapper, "data"]) {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err(ClientError::InvalidResponse(format!(
                "expected a list of {}",
                wrapper
            ))),
        },
        _ => Err(ClientError::InvalidResponse(format!(
            "expected a list of {}",
            wrapper
        ))),
    }
}

/// Normalizes a `getItems` body, skipping entries that are not items.
pub fn decode_items(body: &Value) -> ClientResult<Vec<Item>> {
    check_declared_error(body)?;
    let entries = entries(body, "items")?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let item = parse_item(entry);
            if item.is_none() {
                warn!(%entry, "Skipping item entry that could not be normalized");
            }
            item
        })
        .collect())
}

/// Normalizes a `getTransactions` body in backend (oldest first) order.
pub fn decode_transactions(body: &Value) -> ClientResult<Vec<Transaction>> {
    check_declared_error(body)?;
    let entries = entries(body, "transactions")?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let tx = parse_transaction(entry);
            if tx.is_none() {
                warn!(%entry, "Skipping transaction entry that could not be normalized");
            }
            tx
        })
        .collect())
}

/// Interprets a `getLastTransaction` body. Empty shapes mean "no transactions yet".
pub fn decode_last_transaction(body: &Value) -> ClientResult<Option<Transaction>> {
    match body {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::Array(entries) => Ok(entries.last().and_then(parse_transaction)),
        Value::Object(obj) if obj.is_empty() => Ok(None),
        Value::Object(_) => {
            check_declared_error(body)?;
            parse_transaction(body)
                .map(Some)
                .ok_or_else(|| ClientError::InvalidResponse(format!("not a transaction: {}", body)))
        }
        other => Err(ClientError::InvalidResponse(format!(
            "unexpected last-transaction body: {}",
            other
        ))),
    }
}

/// Fails if a 2xx body declares an error (`{"error": …}` or `{"status": "error"}`).
pub fn check_declared_error(body: &Value) -> ClientResult<()> {
    let Some(obj) = body.as_object() else {
        return Ok(());
    };

    if let Some(error) = field(obj, &["error"]) {
        if !matches!(error, Value::Bool(false)) {
            let message = text(error).unwrap_or_else(|| error.to_string());
            return Err(ClientError::BackendError(message));
        }
    }

    let status_is_error = text_field(obj, &["status"])
        .map(|s| s.eq_ignore_ascii_case("error"))
        .unwrap_or(false);
    if status_is_error {
        let message = text_field(obj, &["message", "details"])
            .unwrap_or_else(|| "backend reported an error".to_string());
        return Err(ClientError::BackendError(message));
    }

    Ok(())
}

// =============================================================================
// Commit Acknowledgement
// =============================================================================

/// The backend's answer to a write.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitAck {
    /// Human-readable message, if the backend sent one.
    pub message: Option<String>,
    /// The body as received.
    pub raw: Value,
}

impl CommitAck {
    /// Accepts a 2xx write response unless it declares an error.
    pub fn from_response(raw: Value) -> ClientResult<Self> {
        check_declared_error(&raw)?;

        let message = match &raw {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(obj) => text_field(obj, &["message", "result", "status"]),
            _ => None,
        };

        Ok(CommitAck { message, raw })
    }
}

// =============================================================================
// Write Bodies
// =============================================================================

/// Builds the POST body for a transaction.
///
/// First stock-ins carry the draft's item fields, with the barcode standing
/// in for a blank name. Defects carry their note as `description`.
pub fn write_body(transaction: &Transaction, draft: Option<&ItemDraft>) -> Value {
    let mut body = json!({
        "action": transaction.kind.action(),
        "barcode": transaction.item_barcode,
        "quantity": transaction.quantity,
        "user": transaction.user,
    });

    let Some(obj) = body.as_object_mut() else {
        return body;
    };

    if let Some(ts) = transaction.timestamp {
        obj.insert("timestamp".into(), json!(ts.to_rfc3339()));
    }

    if let Some(draft) = draft.filter(|_| transaction.kind == TransactionKind::In) {
        obj.insert("name".into(), json!(draft.effective_name()));
        obj.insert("type".into(), json!(draft.item_type));
        obj.insert("category".into(), json!(draft.category));
        obj.insert("minStock".into(), json!(draft.min_stock.unwrap_or(0)));
    }

    if let Some(note) = &transaction.note {
        obj.insert("description".into(), json!(note));
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_normalization_across_variants() {
        let canonical = parse_item(&json!({
            "barcode": "12345", "name": "Bolt M8", "type": "hardware",
            "category": "fasteners", "minStock": 5, "stock": 10
        }))
        .unwrap();

        let sheet = parse_item(&json!({
            "Barcode": 12345, "ItemName": "Bolt M8", "Type": "hardware",
            "Category": "fasteners", "min_stock": "5", "Quantity": "10"
        }))
        .unwrap();

        assert_eq!(canonical, sheet);
        assert_eq!(canonical.stock, 10);
        assert_eq!(canonical.min_stock, 5);
    }

    #[test]
    fn test_item_without_barcode_is_rejected() {
        assert!(parse_item(&json!({"name": "ghost"})).is_none());
        assert!(parse_item(&json!({"barcode": ""})).is_none());
        assert!(parse_item(&json!([])).is_none());
    }

    #[test]
    fn test_lookup_not_found_shapes() {
        for body in [json!(null), json!(""), json!({}), json!([]), json!({"name": "ghost"})] {
            let lookup = decode_lookup("00000", &body).unwrap();
            assert_eq!(
                lookup,
                Lookup::NotFound {
                    barcode: "00000".into()
                },
                "body {} should be NotFound",
                body
            );
        }
    }

    #[test]
    fn test_lookup_declared_error_is_not_a_miss() {
        match decode_lookup("12345", &json!({"error": "Sheet not found"})) {
            Err(ClientError::BackendError(message)) => assert_eq!(message, "Sheet not found"),
            other => panic!("expected BackendError, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_found_in_array() {
        let lookup = decode_lookup("12345", &json!([{"barcode": "12345", "stock": 2}])).unwrap();
        match lookup {
            Lookup::Found(item) => assert_eq!(item.stock, 2),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        assert!(decode_lookup("1", &json!(42)).is_err());
        assert!(decode_lookup("1", &json!("<html>")).is_err());
    }

    #[test]
    fn test_transaction_normalization() {
        let tx = parse_transaction(&json!({
            "Timestamp": "2024-05-01T09:30:00Z",
            "Type": "Defect",
            "ItemName": "Bolt M8",
            "Barcode": "12345",
            "Quantity": "3",
            "User": "WebUser",
            "Description": "cracked"
        }))
        .unwrap();

        assert_eq!(tx.item_barcode, "12345");
        assert_eq!(tx.kind, TransactionKind::Defect);
        assert_eq!(tx.quantity, 3);
        assert_eq!(tx.item_name.as_deref(), Some("Bolt M8"));
        assert_eq!(tx.note.as_deref(), Some("cracked"));
        assert_eq!(
            tx.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_spreadsheet_log_rows_without_barcode() {
        let log = decode_transactions(&json!([
            {"Timestamp": "2024-05-01T08:00:00Z", "Type": "in", "ItemName": "Bolt", "Quantity": 5, "User": "WebUser"},
            {"Timestamp": "2024-05-01T09:00:00Z", "Type": "out", "ItemName": "Nut", "Quantity": "2", "User": "WebUser"}
        ]))
        .unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log[0].item_barcode, "");
        assert_eq!(log[0].item_name.as_deref(), Some("Bolt"));
        assert_eq!(log[0].kind, TransactionKind::In);
        assert_eq!(log[1].quantity, 2);
        assert_eq!(log[1].user, "WebUser");

        // Neither a barcode nor a name: nothing to show
        assert!(parse_transaction(&json!({"type": "in", "quantity": 1})).is_none());
    }

    #[test]
    fn test_unrepresentable_quantity_drops_the_row() {
        assert!(parse_transaction(&json!({"barcode": "1", "type": "in", "quantity": i64::MIN})).is_none());
        assert!(parse_transaction(&json!({"barcode": "1", "type": "in", "quantity": -1e30})).is_none());
        assert_eq!(
            parse_transaction(&json!({"barcode": "1", "type": "out", "quantity": -4}))
                .unwrap()
                .quantity,
            4
        );

        let log = decode_transactions(&json!([
            {"barcode": "1", "type": "in", "quantity": i64::MIN},
            {"barcode": "2", "type": "in", "quantity": 3}
        ]))
        .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].item_barcode, "2");
    }

    #[test]
    fn test_transaction_action_names_map_to_kinds() {
        let tx = parse_transaction(&json!({
            "barcode": "1", "action": "addStockIn", "qty": 4, "date": 1714555800000i64
        }))
        .unwrap();
        assert_eq!(tx.kind, TransactionKind::In);
        assert_eq!(tx.quantity, 4);
        assert!(tx.timestamp.is_some());

        assert!(parse_transaction(&json!({"barcode": "1", "type": "refund", "quantity": 1})).is_none());
    }

    #[test]
    fn test_decode_lists_skip_bad_entries() {
        let items = decode_items(&json!([
            {"barcode": "1", "name": "a"},
            {"name": "no barcode"},
            {"barcode": "2", "name": "b"}
        ]))
        .unwrap();
        assert_eq!(items.len(), 2);

        let wrapped = decode_transactions(&json!({"transactions": [
            {"barcode": "1", "type": "in", "quantity": 1}
        ]}))
        .unwrap();
        assert_eq!(wrapped.len(), 1);

        assert!(decode_items(&json!("nope")).is_err());
        assert!(decode_items(&json!({"error": "sheet missing"})).is_err());
    }

    #[test]
    fn test_last_transaction_shapes() {
        assert_eq!(decode_last_transaction(&json!(null)).unwrap(), None);
        assert_eq!(decode_last_transaction(&json!({})).unwrap(), None);

        let tx = decode_last_transaction(&json!({
            "itemBarcode": "12345", "kind": "defect", "quantity": 3, "user": "WebUser"
        }))
        .unwrap()
        .unwrap();
        assert_eq!(tx.quantity, 3);

        assert!(decode_last_transaction(&json!({"foo": "bar"})).is_err());
    }

    #[test]
    fn test_declared_errors() {
        assert!(check_declared_error(&json!({"status": "success"})).is_ok());
        assert!(check_declared_error(&json!({"error": false})).is_ok());
        assert!(check_declared_error(&json!("Saved")).is_ok());

        match check_declared_error(&json!({"error": "Sheet locked"})) {
            Err(ClientError::BackendError(msg)) => assert_eq!(msg, "Sheet locked"),
            other => panic!("expected BackendError, got {:?}", other),
        }
        match check_declared_error(&json!({"status": "ERROR", "message": "bad qty"})) {
            Err(ClientError::BackendError(msg)) => assert_eq!(msg, "bad qty"),
            other => panic!("expected BackendError, got {:?}", other),
        }
    }

    #[test]
    fn test_commit_ack_message() {
        let ack = CommitAck::from_response(json!({"status": "success", "message": "Stock updated"})).unwrap();
        assert_eq!(ack.message.as_deref(), Some("Stock updated"));

        let ack = CommitAck::from_response(json!("Success")).unwrap();
        assert_eq!(ack.message.as_deref(), Some("Success"));

        assert!(CommitAck::from_response(json!({"error": "nope"})).is_err());
    }

    #[test]
    fn test_write_body_for_new_item() {
        let mut draft = ItemDraft::new("00000");
        draft.category = "tools".into();
        let tx = Transaction {
            item_barcode: "00000".into(),
            kind: TransactionKind::In,
            quantity: 12,
            user: "WebUser".into(),
            timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()),
            item_name: None,
            note: None,
        };

        let body = write_body(&tx, Some(&draft));
        assert_eq!(body["action"], "addStockIn");
        assert_eq!(body["barcode"], "00000");
        assert_eq!(body["name"], "00000");
        assert_eq!(body["type"], "");
        assert_eq!(body["category"], "tools");
        assert_eq!(body["minStock"], 0);
        assert_eq!(body["quantity"], 12);
        assert_eq!(body["user"], "WebUser");
        assert_eq!(body["timestamp"], "2024-05-01T09:30:00+00:00");
    }

    #[test]
    fn test_write_body_for_defect() {
        let tx = Transaction {
            item_barcode: "12345".into(),
            kind: TransactionKind::Defect,
            quantity: 1,
            user: "alice".into(),
            timestamp: None,
            item_name: Some("Bolt M8".into()),
            note: Some("cracked".into()),
        };

        let body = write_body(&tx, None);
        assert_eq!(body["action"], "defect");
        assert_eq!(body["description"], "cracked");
        assert!(body.get("name").is_none());
        assert!(body.get("timestamp").is_none());
    }
}
