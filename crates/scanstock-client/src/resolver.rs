//! # Item Resolver
//!
//! Turns a barcode into an [`Item`](scanstock_core::Item) or a
//! [`Lookup::NotFound`].
//!
//! Every lookup goes to the backend. Nothing is cached, so a barcode that was
//! missing a moment ago is found as soon as someone stocks it in.

use std::sync::Arc;
use tracing::{debug, info};

use scanstock_core::validation::validate_barcode;
use scanstock_core::Lookup;

use crate::error::ClientResult;
use crate::http::Backend;
use crate::protocol::{decode_lookup, ReadAction};
use crate::requester::ResilientRequester;

/// Resolves barcodes against the backend.
#[derive(Clone)]
pub struct ItemResolver {
    backend: Arc<dyn Backend>,
    requester: ResilientRequester,
}

impl ItemResolver {
    pub fn new(backend: Arc<dyn Backend>, requester: ResilientRequester) -> Self {
        Self { backend, requester }
    }

    /// Looks up one barcode.
    ///
    /// Blank or oversized barcodes fail locally without a request. `NotFound`
    /// is a successful answer; transport and backend failures are errors.
    pub async fn lookup_by_barcode(&self, code: &str) -> ClientResult<Lookup> {
        let barcode = validate_barcode(code)?;
        let query = [
            ("action", ReadAction::GetItemByBarcode.as_str()),
            ("barcode", barcode.as_str()),
        ];

        let body = self
            .requester
            .run(ReadAction::GetItemByBarcode.as_str(), || self.backend.get(&query))
            .await
            .into_result()?;

        let lookup = decode_lookup(&barcode, &body)?;
        match &lookup {
            Lookup::Found(item) => {
                info!(barcode = %item.barcode, name = %item.name, stock = item.stock, "Item resolved")
            }
            Lookup::NotFound { barcode } => debug!(%barcode, "Item not found"),
        }

        Ok(lookup)
    }
}
