//! `check`: look barcodes up without recording anything.

use scanstock_core::Lookup;
use tokio::io::{AsyncBufRead, AsyncWrite};

use super::Station;
use crate::console::{BarcodeFeed, Console};
use crate::error::{StationError, StationResult};
use crate::render;

/// Prints what the backend knows about each scanned code.
pub async fn check<R, W>(station: &Station, console: &mut Console<R, W>) -> StationResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let resolver = station.resolver();
    let mut feed = BarcodeFeed::open().await?;

    while let Some(code) = feed.next_code(console).await? {
        match resolver.lookup_by_barcode(&code).await {
            Ok(Lookup::Found(item)) => console.say(render::item_line(&item)).await?,
            Ok(Lookup::NotFound { barcode }) => {
                console
                    .say(format!("{} is not in inventory.", barcode))
                    .await?
            }
            Err(e) => {
                let e = StationError::from(e);
                if e.is_fatal() {
                    return Err(e);
                }
                console.say(e.to_string()).await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fake::{console, output, station, FakeBackend};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_check_found_and_missing() {
        let backend = Arc::new(
            FakeBackend::default()
                .reply(json!({"barcode": "12345", "name": "Bolt M8", "stock": 1, "minStock": 4}))
                .reply(json!([])),
        );
        let station = station(&backend);
        let mut c = console("12345\n99999\n");

        check(&station, &mut c).await.unwrap();

        let gets = backend.gets.lock().unwrap().clone();
        assert_eq!(gets.len(), 2);
        assert!(gets[1].contains(&("barcode".to_string(), "99999".to_string())));
        assert!(backend.posts.lock().unwrap().is_empty());

        let text = output(c);
        assert!(text.contains("Bolt M8"));
        assert!(text.contains("LOW"));
        assert!(text.contains("99999 is not in inventory."));
    }

    #[tokio::test]
    async fn test_check_reports_backend_failure_and_continues() {
        let backend = Arc::new(
            FakeBackend::default()
                .reply(json!({"error": "Sheet not found"}))
                .reply(json!({"barcode": "12345", "name": "Bolt M8", "stock": 9})),
        );
        let station = station(&backend);
        let mut c = console("12345\n12345\n");

        check(&station, &mut c).await.unwrap();

        let text = output(c);
        assert!(text.contains("[Backend] Backend rejected the request: Sheet not found"));
        assert!(text.contains("Bolt M8"));
    }
}
