//! Read-only listings: `items`, `recent`, `last`, `summary`.

use chrono::NaiveDate;
use tokio::io::{AsyncBufRead, AsyncWrite};

use super::Station;
use crate::console::Console;
use crate::error::StationResult;
use crate::render;

/// Prints every item, low-stock items flagged.
pub async fn items<R, W>(station: &Station, console: &mut Console<R, W>) -> StationResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let items = station.queries().list_items().await?;
    if items.is_empty() {
        return console.say("No items.").await;
    }

    let low = items.iter().filter(|item| item.is_below_min_stock()).count();
    for item in &items {
        console.say(render::item_line(item)).await?;
    }
    console
        .say(format!("{} item(s), {} below minimum stock.", items.len(), low))
        .await
}

/// Prints the newest `limit` transactions, newest first.
pub async fn recent<R, W>(
    station: &Station,
    limit: usize,
    console: &mut Console<R, W>,
) -> StationResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let transactions = station.queries().recent_transactions(limit).await?;
    if transactions.is_empty() {
        return console.say("No transactions.").await;
    }

    for tx in &transactions {
        console.say(render::transaction_line(tx)).await?;
    }
    Ok(())
}

/// Prints the most recent committed transaction.
pub async fn last<R, W>(station: &Station, console: &mut Console<R, W>) -> StationResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut cache = station.last_record();
    let record = cache.refresh().await?;
    console.say(render::last_record(record.as_ref())).await
}

/// Prints the dashboard summary for `today`.
pub async fn summary<R, W>(
    station: &Station,
    today: NaiveDate,
    console: &mut Console<R, W>,
) -> StationResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let summary = station.queries().summary(today).await?;
    for line in render::summary(&summary) {
        console.say(line).await?;
    }
    Ok(())
}
