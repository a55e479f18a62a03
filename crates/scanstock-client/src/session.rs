//! # Stock Session
//!
//! One operator screen's worth of pipeline: scan, resolve, validate, submit,
//! refresh.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          StockSession                                   │
//! │                                                                         │
//! │   scan(code) ──► ItemResolver ──► TransactionValidator::load            │
//! │                                                                         │
//! │   enter_quantity / edit_draft / set_note / validate / confirm           │
//! │        └──────────────► TransactionValidator (no I/O)                   │
//! │                                                                         │
//! │   submit() ──► begin_submit ──► TransactionSubmitter                    │
//! │                                      │                                  │
//! │                     ┌────────────────┴───────────────┐                  │
//! │                     ▼ ok                             ▼ err              │
//! │              submit_succeeded                 submit_failed             │
//! │              LastRecordCache::refresh         (back to Validated)       │
//! │              (failure only logged)                                      │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │               SubmitReport                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every log line carries the session's correlation id.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use scanstock_core::{
    DraftEdit, FlowState, Item, LastRecord, LoadedItem, Transaction, TransactionKind,
    TransactionValidator, Validation,
};

use crate::error::ClientResult;
use crate::http::Backend;
use crate::last_record::LastRecordCache;
use crate::protocol::CommitAck;
use crate::requester::ResilientRequester;
use crate::resolver::ItemResolver;
use crate::submitter::TransactionSubmitter;

/// Everything known after a successful submit.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub transaction: Transaction,
    pub ack: CommitAck,
    /// The item with its stock updated locally.
    pub item: Item,
    /// `None` if the refresh after the commit failed.
    pub last_record: Option<LastRecord>,
}

impl SubmitReport {
    pub fn new_stock(&self) -> i64 {
        self.item.stock
    }
}

/// Pipeline for one kind of stock movement.
pub struct StockSession {
    id: Uuid,
    span: Span,
    validator: TransactionValidator,
    resolver: ItemResolver,
    submitter: TransactionSubmitter,
    last_record: LastRecordCache,
}

impl StockSession {
    pub fn new(
        kind: TransactionKind,
        user: impl Into<String>,
        backend: Arc<dyn Backend>,
        requester: ResilientRequester,
    ) -> Self {
        let id = Uuid::new_v4();
        let user = user.into();
        let span = info_span!("stock_session", session_id = %id, %kind, %user);

        Self {
            id,
            span,
            validator: TransactionValidator::new(kind, user),
            resolver: ItemResolver::new(backend.clone(), requester),
            submitter: TransactionSubmitter::new(backend.clone(), requester),
            last_record: LastRecordCache::new(backend, requester),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.validator.kind()
    }

    pub fn state(&self) -> &FlowState {
        self.validator.state()
    }

    pub fn validator(&self) -> &TransactionValidator {
        &self.validator
    }

    /// The last refreshed record, if any.
    pub fn last_record(&self) -> Option<&LastRecord> {
        self.last_record.current()
    }

    // =========================================================================
    // Pipeline Steps
    // =========================================================================

    /// Resolves a scanned code and loads the result.
    pub async fn scan(&mut self, code: &str) -> ClientResult<&LoadedItem> {
        if self.validator.is_submitting() {
            return Err(scanstock_core::CoreError::SubmitInFlight.into());
        }

        let lookup = self
            .resolver
            .lookup_by_barcode(code)
            .instrument(self.span.clone())
            .await?;

        let _enter = self.span.enter();
        match self.validator.load(lookup) {
            Ok(item) => {
                info!(barcode = %item.barcode(), new = item.is_new(), "Item loaded");
                Ok(item)
            }
            Err(e) => {
                warn!(error = %e, "Scan rejected");
                Err(e.into())
            }
        }
    }

    pub fn enter_quantity(&mut self, quantity: i64) -> ClientResult<()> {
        Ok(self.validator.enter_quantity(quantity)?)
    }

    pub fn enter_quantity_text(&mut self, input: &str) -> ClientResult<()> {
        Ok(self.validator.enter_quantity_text(input)?)
    }

    pub fn edit_draft(&mut self, edit: DraftEdit) -> ClientResult<()> {
        Ok(self.validator.edit_draft(edit)?)
    }

    pub fn set_note(&mut self, note: Option<String>) -> ClientResult<()> {
        Ok(self.validator.set_note(note)?)
    }

    pub fn validate(&mut self) -> ClientResult<Validation> {
        let _enter = self.span.enter();
        let outcome = self.validator.validate()?;
        if let Validation::NeedsConfirmation(warning) = &outcome {
            info!(%warning, "Confirmation required");
        }
        Ok(outcome)
    }

    pub fn confirm(&mut self, accept: bool) -> ClientResult<()> {
        let _enter = self.span.enter();
        info!(accept, "Below-minimum warning answered");
        Ok(self.validator.confirm(accept)?)
    }

    /// Submits the validated transaction.
    ///
    /// On failure the validator returns to `Validated` so the same data can be
    /// submitted again. Dropping the returned future mid-flight has the same
    /// effect.
    pub async fn submit(&mut self) -> ClientResult<SubmitReport> {
        let span = self.span.clone();
        let submission = self.validator.begin_submit(Utc::now())?;
        let mut pending = PendingSubmit {
            validator: &mut self.validator,
            settled: false,
        };

        let result = self
            .submitter
            .submit(&submission.transaction, submission.draft.as_ref())
            .instrument(span.clone())
            .await;

        let ack = match result {
            Ok(ack) => ack,
            Err(e) => {
                pending.settled = true;
                pending.validator.submit_failed(e.to_string())?;
                span.in_scope(|| warn!(error = %e, "Submit failed"));
                return Err(e);
            }
        };

        pending.settled = true;
        let (item, transaction) = pending.validator.submit_succeeded()?;

        let last_record = match self.last_record.refresh().instrument(span.clone()).await {
            Ok(record) => record,
            Err(e) => {
                span.in_scope(|| warn!(error = %e, "Last record refresh failed after commit"));
                None
            }
        };

        Ok(SubmitReport {
            transaction,
            ack,
            item,
            last_record,
        })
    }

    /// Re-reads the backend's last transaction.
    pub async fn refresh_last_record(&mut self) -> ClientResult<Option<LastRecord>> {
        self.last_record.refresh().instrument(self.span.clone()).await
    }

    /// Drops the loaded item.
    pub fn reset(&mut self) -> ClientResult<()> {
        Ok(self.validator.reset()?)
    }
}

/// Returns the validator to `Validated` if a submit is abandoned.
struct PendingSubmit<'a> {
    validator: &'a mut TransactionValidator,
    settled: bool,
}

impl Drop for PendingSubmit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.validator.submit_failed("submission cancelled").is_err() {
            warn!("Cancelled submit left the validator in an unexpected state");
        }
    }
}
