//! # Transaction Submitter
//!
//! Posts one validated transaction to the backend.
//!
//! Writes carry no idempotency key. A retried submit whose first attempt
//! reached the backend before the connection failed is recorded twice;
//! the backend protocol offers no way to tell the attempts apart.

use std::sync::Arc;
use tracing::info;

use scanstock_core::validation::validate_quantity;
use scanstock_core::{ItemDraft, Transaction};

use crate::error::ClientResult;
use crate::http::Backend;
use crate::protocol::{write_body, CommitAck};
use crate::requester::{RequestOutcome, ResilientRequester};

/// Sends transactions to the backend.
#[derive(Clone)]
pub struct TransactionSubmitter {
    backend: Arc<dyn Backend>,
    requester: ResilientRequester,
}

impl TransactionSubmitter {
    pub fn new(backend: Arc<dyn Backend>, requester: ResilientRequester) -> Self {
        Self { backend, requester }
    }

    /// Submits `transaction`, with item fields from `draft` on a first stock-in.
    ///
    /// A 2xx body that declares an error counts as a rejection and is not
    /// retried.
    pub async fn submit(
        &self,
        transaction: &Transaction,
        draft: Option<&ItemDraft>,
    ) -> ClientResult<CommitAck> {
        validate_quantity(transaction.quantity)?;

        let body = write_body(transaction, draft);
        let backend = &self.backend;
        let body_ref = &body;

        let outcome = self
            .requester
            .run(transaction.kind.action(), move || async move {
                CommitAck::from_response(backend.post(body_ref).await?)
            })
            .await;

        if let RequestOutcome::Success(ack) = &outcome {
            info!(
                barcode = %transaction.item_barcode,
                kind = %transaction.kind,
                quantity = transaction.quantity,
                message = ?ack.message,
                "Transaction committed"
            );
        }

        outcome.into_result()
    }
}
