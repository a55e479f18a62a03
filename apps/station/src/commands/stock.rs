//! # Stock Movement Commands
//!
//! `stock-in`, `stock-out` and `defect` all run the same loop over a
//! [`StockSession`]; only the prompts differ.
//!
//! ## Per-Barcode Flow
//! ```text
//! barcode ──► scan ──► (new item? ask name/type/category/min stock)
//!                 ──► (defect? ask description)
//!                 ──► quantity (re-asked until valid)
//!                 ──► validate ──► below minimum? ask to continue
//!                 ──► submit ──► failed? offer retry with the same data
//!                 ──► report + last record
//! ```
//!
//! Anything that goes wrong with one barcode is printed and the loop moves
//! on to the next scan.

use scanstock_client::StockSession;
use scanstock_core::validation::validate_min_stock;
use scanstock_core::{CoreError, DraftEdit, TransactionKind, Validation};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info};

use super::Station;
use crate::console::{BarcodeFeed, Console};
use crate::error::{ErrorCode, StationError, StationResult};
use crate::render;

/// Runs the scan loop for one kind of movement.
///
/// Returns how many transactions were committed.
pub async fn run<R, W>(
    station: &Station,
    kind: TransactionKind,
    console: &mut Console<R, W>,
) -> StationResult<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session = station.session(kind);
    let mut feed = BarcodeFeed::open().await?;
    let mut committed = 0;

    info!(session_id = %session.id(), %kind, user = station.user(), "Stock command started");
    console
        .say(format!("Recording {} as {}.", title(kind), station.user()))
        .await?;

    while let Some(code) = feed.next_code(console).await? {
        match process(&mut session, &code, console).await {
            Ok(true) => committed += 1,
            Ok(false) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => console.say(e.to_string()).await?,
        }
        session.reset()?;
    }

    info!(session_id = %session.id(), committed, "Stock command finished");
    console.say(format!("{} transaction(s) committed.", committed)).await?;
    Ok(committed)
}

fn title(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::In => "stock in",
        TransactionKind::Out => "stock out",
        TransactionKind::Defect => "defects",
    }
}

/// Handles one scanned code. `Ok(false)` when the operator backed out.
async fn process<R, W>(
    session: &mut StockSession,
    code: &str,
    console: &mut Console<R, W>,
) -> StationResult<bool>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let loaded = session.scan(code).await?;
    let summary = render::loaded_item(loaded);
    let barcode = loaded.barcode().to_string();
    let is_new = loaded.is_new();
    console.say(summary).await?;

    if is_new {
        describe_new_item(session, &barcode, console).await?;
    }

    if session.kind() == TransactionKind::Defect {
        let note = console.ask_required("Defect description (optional):").await?;
        session.set_note((!note.is_empty()).then_some(note))?;
    }

    loop {
        let input = console.ask_required("Quantity:").await?;
        match session.enter_quantity_text(&input) {
            Ok(()) => break,
            Err(e) => {
                let e = StationError::from(e);
                if e.code != ErrorCode::ValidationError {
                    return Err(e);
                }
                console.say(e.to_string()).await?;
            }
        }
    }

    if let Validation::NeedsConfirmation(warning) = session.validate()? {
        console.say(format!("Warning: {}.", warning)).await?;
        let accept = console.ask_yes_no("Continue?", false).await?;
        session.confirm(accept)?;
        if !accept {
            console.say("Cancelled. Nothing was sent.").await?;
            return Ok(false);
        }
    }

    loop {
        match session.submit().await {
            Ok(report) => {
                console.say(render::report(&report)).await?;
                console
                    .say(render::last_record(report.last_record.as_ref()))
                    .await?;
                return Ok(true);
            }
            Err(e) => {
                let e = StationError::from(e);
                if !matches!(
                    e.code,
                    ErrorCode::Network | ErrorCode::Timeout | ErrorCode::Backend
                ) {
                    return Err(e);
                }
                console.say(e.to_string()).await?;
                if !console.ask_yes_no("Retry submission?", true).await? {
                    debug!(barcode = %barcode, "Submission abandoned by operator");
                    return Ok(false);
                }
            }
        }
    }
}

/// Collects the details of a barcode the backend has never seen.
///
/// Blank answers keep the defaults: name falls back to the barcode, minimum
/// stock to zero.
async fn describe_new_item<R, W>(
    session: &mut StockSession,
    barcode: &str,
    console: &mut Console<R, W>,
) -> StationResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let name = console.ask_required(&format!("Name [{}]:", barcode)).await?;
    let item_type = console.ask_required("Type:").await?;
    let category = console.ask_required("Category:").await?;

    let min_stock = loop {
        let input = console.ask_required("Minimum stock [0]:").await?;
        if input.is_empty() {
            break None;
        }
        match input.parse::<i64>() {
            Ok(n) => match validate_min_stock(n) {
                Ok(n) => break Some(n),
                Err(e) => {
                    console
                        .say(StationError::from(CoreError::from(e)).to_string())
                        .await?
                }
            },
            Err(_) => console.say("Minimum stock must be a whole number.").await?,
        }
    };

    let non_empty = |s: String| (!s.is_empty()).then_some(s);
    session.edit_draft(DraftEdit {
        name: non_empty(name),
        item_type: non_empty(item_type),
        category: non_empty(category),
        min_stock,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fake::{console, output, station, FakeBackend};
    use scanstock_client::ClientError;
    use serde_json::json;
    use std::sync::Arc;

    fn bolt(stock: i64, min_stock: i64) -> serde_json::Value {
        json!({"barcode": "12345", "name": "Bolt M8", "stock": stock, "minStock": min_stock})
    }

    fn last(kind: &str, quantity: i64) -> serde_json::Value {
        json!({
            "barcode": "12345",
            "type": kind,
            "quantity": quantity,
            "user": "ana",
            "timestamp": "2024-05-01T09:30:00Z",
            "itemName": "Bolt M8"
        })
    }

    #[tokio::test]
    async fn test_stock_out_commits_and_shows_last_record() {
        let backend = Arc::new(
            FakeBackend::default()
                .reply(bolt(10, 2))
                .reply(json!({"message": "ok"}))
                .reply(last("out", 3)),
        );
        let station = station(&backend);
        let mut c = console("12345\n3\nq\n");

        let committed = run(&station, TransactionKind::Out, &mut c).await.unwrap();
        assert_eq!(committed, 1);

        let posts = backend.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["action"], "stockOut");
        assert_eq!(posts[0]["barcode"], "12345");
        assert_eq!(posts[0]["quantity"], 3);
        assert_eq!(posts[0]["user"], "ana");

        let text = output(c);
        assert!(text.contains("Stock is now 7."));
        assert!(text.contains("Last record: 2024-05-01 09:30"));
    }

    #[tokio::test]
    async fn test_insufficient_stock_never_posts() {
        let backend = Arc::new(FakeBackend::default().reply(bolt(3, 0)));
        let station = station(&backend);
        let mut c = console("12345\n5\n");

        let committed = run(&station, TransactionKind::Out, &mut c).await.unwrap();
        assert_eq!(committed, 0);
        assert!(backend.posts.lock().unwrap().is_empty());
        assert!(output(c).contains("[InsufficientStock]"));
    }

    #[tokio::test]
    async fn test_invalid_quantity_is_asked_again() {
        let backend = Arc::new(
            FakeBackend::default()
                .reply(bolt(10, 0))
                .reply(json!({"message": "ok"})),
        );
        let station = station(&backend);
        let mut c = console("12345\nabc\n0\n2\n");

        assert_eq!(run(&station, TransactionKind::Out, &mut c).await.unwrap(), 1);
        let posts = backend.posts.lock().unwrap().clone();
        assert_eq!(posts[0]["quantity"], 2);
        assert_eq!(output(c).matches("[ValidationError]").count(), 2);
    }

    #[tokio::test]
    async fn test_declining_min_stock_warning_sends_nothing() {
        let backend = Arc::new(FakeBackend::default().reply(bolt(5, 4)));
        let station = station(&backend);
        let mut c = console("12345\n3\nn\n");

        assert_eq!(run(&station, TransactionKind::Out, &mut c).await.unwrap(), 0);
        assert!(backend.posts.lock().unwrap().is_empty());

        let text = output(c);
        assert!(text.contains("Warning: Stock of 12345 will drop to 2, below the minimum of 4."));
        assert!(text.contains("Cancelled. Nothing was sent."));
    }

    #[tokio::test]
    async fn test_blank_answer_to_min_stock_warning_declines() {
        let backend = Arc::new(FakeBackend::default().reply(bolt(5, 4)));
        let station = station(&backend);
        let mut c = console("12345\n3\n\n");

        assert_eq!(run(&station, TransactionKind::Out, &mut c).await.unwrap(), 0);
        assert!(backend.posts.lock().unwrap().is_empty());

        let text = output(c);
        assert!(text.contains("Continue? [y/N]"));
        assert!(text.contains("Cancelled. Nothing was sent."));
    }

    #[tokio::test]
    async fn test_explicit_yes_commits_below_minimum() {
        let backend = Arc::new(
            FakeBackend::default()
                .reply(bolt(5, 4))
                .reply(json!({"message": "ok"})),
        );
        let station = station(&backend);
        let mut c = console("12345\n3\ny\n");

        assert_eq!(run(&station, TransactionKind::Out, &mut c).await.unwrap(), 1);
        assert_eq!(backend.posts.lock().unwrap().len(), 1);
        assert!(output(c).contains("Stock is now 2."));
    }

    #[tokio::test]
    async fn test_unknown_barcode_on_stock_out() {
        let backend = Arc::new(FakeBackend::default().reply(json!({})));
        let station = station(&backend);
        let mut c = console("99999\n");

        assert_eq!(run(&station, TransactionKind::Out, &mut c).await.unwrap(), 0);
        assert!(output(c).contains("[NotFound] Item 99999 is not in stock"));
    }

    #[tokio::test]
    async fn test_stock_in_new_item_sends_details() {
        let backend = Arc::new(
            FakeBackend::default()
                .reply(json!(null))
                .reply(json!({"message": "created"})),
        );
        let station = station(&backend);
        let mut c = console("NEW-1\nWasher\nHardware\nFasteners\n-1\n5\n20\n");

        assert_eq!(run(&station, TransactionKind::In, &mut c).await.unwrap(), 1);

        let posts = backend.posts.lock().unwrap().clone();
        assert_eq!(posts[0]["action"], "addStockIn");
        assert_eq!(posts[0]["name"], "Washer");
        assert_eq!(posts[0]["type"], "Hardware");
        assert_eq!(posts[0]["category"], "Fasteners");
        assert_eq!(posts[0]["minStock"], 5);
        assert_eq!(posts[0]["quantity"], 20);

        let text = output(c);
        assert!(text.contains("New item NEW-1"));
        assert!(text.contains("Stock is now 20."));
    }

    #[tokio::test]
    async fn test_defect_records_description() {
        let backend = Arc::new(
            FakeBackend::default()
                .reply(bolt(10, 0))
                .reply(json!({"message": "ok"})),
        );
        let station = station(&backend);
        let mut c = console("12345\ncracked head\n1\n");

        assert_eq!(run(&station, TransactionKind::Defect, &mut c).await.unwrap(), 1);
        let posts = backend.posts.lock().unwrap().clone();
        assert_eq!(posts[0]["action"], "defect");
        assert_eq!(posts[0]["description"], "cracked head");
    }

    #[tokio::test]
    async fn test_failed_submit_can_be_retried() {
        let backend = Arc::new(
            FakeBackend::default()
                .reply(bolt(10, 0))
                .fail(ClientError::Http {
                    status: 502,
                    body: "{}".into(),
                })
                .reply(json!({"message": "ok"})),
        );
        let station = station(&backend);
        let mut c = console("12345\n4\n\n");

        assert_eq!(run(&station, TransactionKind::Out, &mut c).await.unwrap(), 1);
        let posts = backend.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 2);
        assert!(posts[0].get("timestamp").is_some());
        assert_eq!(posts[0], posts[1]);

        let text = output(c);
        assert!(text.contains("[Network] Gave up after 1 attempts"));
        assert!(text.contains("Stock is now 6."));
    }

    #[tokio::test]
    async fn test_eof_mid_transaction_is_fatal() {
        let backend = Arc::new(FakeBackend::default().reply(bolt(10, 0)));
        let station = station(&backend);
        let mut c = console("12345\n");

        let err = run(&station, TransactionKind::Out, &mut c).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(backend.posts.lock().unwrap().is_empty());
    }
}
