//! # Transaction Workflow
//!
//! The state machine every stock movement passes through before, during and
//! after submission.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Transaction Validator                                │
//! │                                                                         │
//! │  ┌──────┐  load(Found)     ┌────────────┐  enter_quantity  ┌──────────┐ │
//! │  │ Idle │ ───────────────► │ ItemLoaded │ ───────────────► │ Quantity │ │
//! │  └──────┘  load(NotFound)  └────────────┘                  │ Entered  │ │
//! │     ▲      + stock-in: draft                               └────┬─────┘ │
//! │     │                                                           │       │
//! │     │ NotFound on out/defect                          validate()│       │
//! │     │ ("item is not in stock")                ┌─────────────────┤       │
//! │                                               │                 │       │
//! │                       below minStock          ▼                 │ ok    │
//! │                  ┌─────────────────────────────────┐            │       │
//! │                  │     AwaitingConfirmation        │            │       │
//! │                  │  confirm(false) → QuantityEntered│            │       │
//! │                  └───────────────┬─────────────────┘            │       │
//! │                                  │ confirm(true)                ▼       │
//! │                                  └──────────────────────► ┌───────────┐ │
//! │                                                           │ Validated │ │
//! │  ┌───────────┐  submit_succeeded  ┌────────────┐ begin    └───────────┘ │
//! │  │ Committed │ ◄───────────────── │ Submitting │ ◄──────────────┘  ▲    │
//! │  └───────────┘                    └─────┬──────┘                   │    │
//! │                                         │ submit_failed            │    │
//! │                                         └──────────────────────────┘    │
//! │                                                                         │
//! │  InsufficientStock keeps the validator in QuantityEntered and is       │
//! │  raised before any request exists.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The validator never performs I/O. Callers feed it lookup results and
//! submission outcomes and read back the transaction to send.

use chrono::{DateTime, Utc};
use std::mem;

use crate::error::{CoreError, CoreResult};
use crate::types::{BelowMinStockWarning, DraftEdit, Item, ItemDraft, Lookup, Transaction, TransactionKind};
use crate::validation::{parse_quantity, validate_min_stock, validate_quantity};

// =============================================================================
// Loaded Item
// =============================================================================

/// The item a transaction is being prepared for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedItem {
    /// Item already recorded by the backend. Its details are read-only.
    Known(Item),
    /// Unseen barcode on the stock-in path.
    New(ItemDraft),
}

impl LoadedItem {
    pub fn barcode(&self) -> &str {
        match self {
            LoadedItem::Known(item) => &item.barcode,
            LoadedItem::New(draft) => &draft.barcode,
        }
    }

    /// Stock on hand. A draft has none.
    pub fn stock(&self) -> i64 {
        match self {
            LoadedItem::Known(item) => item.stock,
            LoadedItem::New(_) => 0,
        }
    }

    /// Effective reorder threshold.
    pub fn min_stock(&self) -> i64 {
        match self {
            LoadedItem::Known(item) => item.min_stock,
            LoadedItem::New(draft) => draft.min_stock.unwrap_or(0),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LoadedItem::Known(item) => &item.name,
            LoadedItem::New(draft) => draft.effective_name(),
        }
    }

    #[inline]
    pub fn is_new(&self) -> bool {
        matches!(self, LoadedItem::New(_))
    }
}

// =============================================================================
// Flow State
// =============================================================================

/// Current state of a [`TransactionValidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    ItemLoaded {
        item: LoadedItem,
    },
    QuantityEntered {
        item: LoadedItem,
        quantity: i64,
    },
    /// Pending operator confirmation of a below-threshold withdrawal.
    AwaitingConfirmation {
        item: LoadedItem,
        quantity: i64,
        warning: BelowMinStockWarning,
    },
    Validated {
        item: LoadedItem,
        quantity: i64,
    },
    Submitting {
        item: LoadedItem,
        quantity: i64,
        transaction: Transaction,
    },
    Committed {
        item: Item,
        transaction: Transaction,
    },
}

impl FlowState {
    /// Short state name for messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::ItemLoaded { .. } => "item loaded",
            FlowState::QuantityEntered { .. } => "quantity entered",
            FlowState::AwaitingConfirmation { .. } => "awaiting confirmation",
            FlowState::Validated { .. } => "validated",
            FlowState::Submitting { .. } => "submitting",
            FlowState::Committed { .. } => "committed",
        }
    }
}

/// Result of [`TransactionValidator::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Ready to submit.
    Ready,
    /// The operator must call [`TransactionValidator::confirm`] first.
    NeedsConfirmation(BelowMinStockWarning),
}

/// What the network layer needs to send one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub transaction: Transaction,
    /// Item fields for a first stock-in; `None` for known items.
    pub draft: Option<ItemDraft>,
}

// =============================================================================
// Transaction Validator
// =============================================================================

/// Enforces quantity and stock invariants for one kind of stock movement.
///
/// One validator serves one operator screen: a new scan replaces the loaded
/// item, and at most one submission can be pending at a time.
#[derive(Debug, Clone)]
pub struct TransactionValidator {
    kind: TransactionKind,
    user: String,
    note: Option<String>,
    state: FlowState,
    last_failure: Option<String>,
    /// Transaction of a failed submit; the next submit re-sends it unchanged.
    retry: Option<Transaction>,
}

impl TransactionValidator {
    /// Creates an idle validator for `kind` transactions by `user`.
    pub fn new(kind: TransactionKind, user: impl Into<String>) -> Self {
        TransactionValidator {
            kind,
            user: user.into(),
            note: None,
            state: FlowState::Idle,
            last_failure: None,
            retry: None,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Reason the last submission failed, cleared by the next success or scan.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// The loaded item, if any state holds one.
    pub fn item(&self) -> Option<&LoadedItem> {
        match &self.state {
            FlowState::ItemLoaded { item }
            | FlowState::QuantityEntered { item, .. }
            | FlowState::AwaitingConfirmation { item, .. }
            | FlowState::Validated { item, .. }
            | FlowState::Submitting { item, .. } => Some(item),
            FlowState::Idle | FlowState::Committed { .. } => None,
        }
    }

    /// The entered quantity, if any.
    pub fn quantity(&self) -> Option<i64> {
        match &self.state {
            FlowState::QuantityEntered { quantity, .. }
            | FlowState::AwaitingConfirmation { quantity, .. }
            | FlowState::Validated { quantity, .. }
            | FlowState::Submitting { quantity, .. } => Some(*quantity),
            FlowState::Committed { transaction, .. } => Some(transaction.quantity),
            FlowState::Idle | FlowState::ItemLoaded { .. } => None,
        }
    }

    /// Returns true while a submission is pending.
    pub fn is_submitting(&self) -> bool {
        matches!(self.state, FlowState::Submitting { .. })
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Loads the result of a barcode lookup.
    ///
    /// ## Behavior
    /// - `Found`: the item is loaded as known
    /// - `NotFound` on stock-in: an empty draft is loaded
    /// - `NotFound` on out/defect: back to `Idle`, `ItemNotInStock`
    pub fn load(&mut self, lookup: Lookup) -> CoreResult<&LoadedItem> {
        if self.is_submitting() {
            return Err(CoreError::SubmitInFlight);
        }

        self.last_failure = None;
        self.note = None;
        self.retry = None;

        let item = match lookup {
            Lookup::Found(item) => LoadedItem::Known(item),
            Lookup::NotFound { barcode } if self.kind == TransactionKind::In => {
                LoadedItem::New(ItemDraft::new(barcode))
            }
            Lookup::NotFound { barcode } => {
                self.state = FlowState::Idle;
                return Err(CoreError::ItemNotInStock { barcode });
            }
        };

        self.state = FlowState::ItemLoaded { item };
        match &self.state {
            FlowState::ItemLoaded { item } => Ok(item),
            _ => Err(CoreError::InvalidState {
                operation: "load an item",
                state: self.state.name(),
            }),
        }
    }

    /// Edits the details of a new item.
    ///
    /// Known items are locked to the backend's values so the reorder
    /// threshold cannot drift silently. Editing a validated draft sends it
    /// back to `QuantityEntered`.
    pub fn edit_draft(&mut self, edit: DraftEdit) -> CoreResult<()> {
        if self.is_submitting() {
            return Err(CoreError::SubmitInFlight);
        }
        if let Some(min_stock) = edit.min_stock {
            validate_min_stock(min_stock)?;
        }

        let state_name = self.state.name();
        let draft = match &mut self.state {
            FlowState::ItemLoaded { item }
            | FlowState::QuantityEntered { item, .. }
            | FlowState::AwaitingConfirmation { item, .. }
            | FlowState::Validated { item, .. } => match item {
                LoadedItem::New(draft) => draft,
                LoadedItem::Known(known) => {
                    return Err(CoreError::MinStockLocked {
                        barcode: known.barcode.clone(),
                    })
                }
            },
            _ => {
                return Err(CoreError::InvalidState {
                    operation: "edit item details",
                    state: state_name,
                })
            }
        };

        if let Some(name) = edit.name {
            draft.name = name.trim().to_string();
        }
        if let Some(item_type) = edit.item_type {
            draft.item_type = item_type.trim().to_string();
        }
        if let Some(category) = edit.category {
            draft.category = category.trim().to_string();
        }
        if edit.min_stock.is_some() {
            draft.min_stock = edit.min_stock;
        }
        self.retry = None;

        self.state = match mem::replace(&mut self.state, FlowState::Idle) {
            FlowState::Validated { item, quantity }
            | FlowState::AwaitingConfirmation { item, quantity, .. } => {
                FlowState::QuantityEntered { item, quantity }
            }
            other => other,
        };
        Ok(())
    }

    /// Attaches a free-text note (defect description) to the next submission.
    pub fn set_note(&mut self, note: Option<String>) -> CoreResult<()> {
        if self.is_submitting() {
            return Err(CoreError::SubmitInFlight);
        }
        self.note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self.retry = None;
        Ok(())
    }

    /// Records the quantity for the loaded item.
    ///
    /// Non-positive quantities fail with `InvalidQuantity` whatever the state;
    /// the state is left unchanged on any error.
    pub fn enter_quantity(&mut self, quantity: i64) -> CoreResult<()> {
        let quantity = validate_quantity(quantity)?;

        if self.is_submitting() {
            return Err(CoreError::SubmitInFlight);
        }

        self.state = match mem::replace(&mut self.state, FlowState::Idle) {
            FlowState::ItemLoaded { item }
            | FlowState::QuantityEntered { item, .. }
            | FlowState::AwaitingConfirmation { item, .. }
            | FlowState::Validated { item, .. } => FlowState::QuantityEntered { item, quantity },
            other => {
                let state = other.name();
                self.state = other;
                return Err(CoreError::InvalidState {
                    operation: "enter a quantity",
                    state,
                });
            }
        };
        self.retry = None;
        Ok(())
    }

    /// Parses and records a typed quantity.
    pub fn enter_quantity_text(&mut self, input: &str) -> CoreResult<()> {
        let quantity = parse_quantity(input)?;
        self.enter_quantity(quantity)
    }

    /// Checks stock invariants for the entered quantity.
    ///
    /// ## Rules
    /// - out/defect with `quantity > stock` → `InsufficientStock`
    /// - out/defect leaving `stock - quantity < min_stock` → confirmation
    /// - anything else → `Validated`
    pub fn validate(&mut self) -> CoreResult<Validation> {
        let (barcode, stock, min_stock, quantity) = match &self.state {
            FlowState::QuantityEntered { item, quantity } => (
                item.barcode().to_string(),
                item.stock(),
                item.min_stock(),
                *quantity,
            ),
            FlowState::Validated { .. } => return Ok(Validation::Ready),
            FlowState::AwaitingConfirmation { warning, .. } => {
                return Ok(Validation::NeedsConfirmation(warning.clone()))
            }
            FlowState::Submitting { .. } => return Err(CoreError::SubmitInFlight),
            other => {
                return Err(CoreError::InvalidState {
                    operation: "validate",
                    state: other.name(),
                })
            }
        };

        if self.kind.is_withdrawal() && quantity > stock {
            return Err(CoreError::InsufficientStock {
                barcode,
                available: stock,
                requested: quantity,
            });
        }

        let resulting_stock =
            self.kind
                .apply(stock, quantity)
                .ok_or_else(|| CoreError::StockOutOfRange {
                    barcode: barcode.clone(),
                    stock,
                    quantity,
                })?;
        let warning = (self.kind.is_withdrawal() && resulting_stock < min_stock).then(|| {
            BelowMinStockWarning {
                barcode,
                resulting_stock,
                min_stock,
            }
        });

        let outcome = match &warning {
            Some(w) => Validation::NeedsConfirmation(w.clone()),
            None => Validation::Ready,
        };

        self.state = match mem::replace(&mut self.state, FlowState::Idle) {
            FlowState::QuantityEntered { item, quantity } => match warning {
                Some(warning) => FlowState::AwaitingConfirmation {
                    item,
                    quantity,
                    warning,
                },
                None => FlowState::Validated { item, quantity },
            },
            other => other,
        };

        Ok(outcome)
    }

    /// Answers a below-threshold warning.
    ///
    /// Declining returns to `QuantityEntered` with nothing sent and the
    /// item's stock untouched.
    pub fn confirm(&mut self, accept: bool) -> CoreResult<()> {
        self.state = match mem::replace(&mut self.state, FlowState::Idle) {
            FlowState::AwaitingConfirmation { item, quantity, .. } if accept => {
                FlowState::Validated { item, quantity }
            }
            FlowState::AwaitingConfirmation { item, quantity, .. } => {
                FlowState::QuantityEntered { item, quantity }
            }
            other => {
                let state = other.name();
                self.state = other;
                return Err(CoreError::InvalidState {
                    operation: "confirm",
                    state,
                });
            }
        };
        Ok(())
    }

    /// Moves a validated transaction into `Submitting`.
    ///
    /// `now` stamps the transaction; the caller owns the clock. A second call
    /// while the first is pending fails with `SubmitInFlight`.
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> CoreResult<Submission> {
        let (item, quantity) = match mem::replace(&mut self.state, FlowState::Idle) {
            FlowState::Validated { item, quantity } => (item, quantity),
            other => {
                let err = if matches!(other, FlowState::Submitting { .. }) {
                    CoreError::SubmitInFlight
                } else {
                    CoreError::InvalidState {
                        operation: "submit",
                        state: other.name(),
                    }
                };
                self.state = other;
                return Err(err);
            }
        };

        let transaction = self.retry.take().unwrap_or_else(|| Transaction {
            item_barcode: item.barcode().to_string(),
            kind: self.kind,
            quantity,
            user: self.user.clone(),
            timestamp: Some(now),
            item_name: Some(item.name().to_string()),
            note: self.note.clone(),
        });
        let draft = match &item {
            LoadedItem::New(draft) => Some(draft.clone()),
            LoadedItem::Known(_) => None,
        };

        self.state = FlowState::Submitting {
            item,
            quantity,
            transaction: transaction.clone(),
        };

        Ok(Submission { transaction, draft })
    }

    /// Records a successful submission.
    ///
    /// The item's stock is updated optimistically; backend truth arrives with
    /// the next last-record refresh. A committed draft becomes a known item.
    pub fn submit_succeeded(&mut self) -> CoreResult<(Item, Transaction)> {
        let new_stock = match &self.state {
            FlowState::Submitting { item, quantity, .. } => self
                .kind
                .apply(item.stock(), *quantity)
                .ok_or_else(|| CoreError::StockOutOfRange {
                    barcode: item.barcode().to_string(),
                    stock: item.stock(),
                    quantity: *quantity,
                })?,
            other => {
                return Err(CoreError::InvalidState {
                    operation: "commit",
                    state: other.name(),
                })
            }
        };

        let (item, transaction) = match mem::replace(&mut self.state, FlowState::Idle) {
            FlowState::Submitting {
                item, transaction, ..
            } => (item, transaction),
            other => {
                let state = other.name();
                self.state = other;
                return Err(CoreError::InvalidState {
                    operation: "commit",
                    state,
                });
            }
        };

        let item = match item {
            LoadedItem::Known(mut known) => {
                known.stock = new_stock;
                known
            }
            LoadedItem::New(draft) => draft.into_item(new_stock),
        };

        self.last_failure = None;
        self.note = None;
        self.state = FlowState::Committed {
            item: item.clone(),
            transaction: transaction.clone(),
        };

        Ok((item, transaction))
    }

    /// Records a failed submission and returns to `Validated` for a retry.
    ///
    /// The retry sends the same transaction, timestamp included.
    pub fn submit_failed(&mut self, reason: impl Into<String>) -> CoreResult<()> {
        self.state = match mem::replace(&mut self.state, FlowState::Idle) {
            FlowState::Submitting {
                item,
                quantity,
                transaction,
            } => {
                self.retry = Some(transaction);
                FlowState::Validated { item, quantity }
            }
            other => {
                let state = other.name();
                self.state = other;
                return Err(CoreError::InvalidState {
                    operation: "record a failure",
                    state,
                });
            }
        };
        self.last_failure = Some(reason.into());
        Ok(())
    }

    /// Drops whatever is loaded and returns to `Idle`.
    pub fn reset(&mut self) -> CoreResult<()> {
        if self.is_submitting() {
            return Err(CoreError::SubmitInFlight);
        }
        self.state = FlowState::Idle;
        self.note = None;
        self.last_failure = None;
        self.retry = None;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use chrono::TimeZone;

    fn item(stock: i64, min_stock: i64) -> Item {
        Item::new("12345", "Bolt M8", stock, min_stock)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn loaded(kind: TransactionKind, item: Item) -> TransactionValidator {
        let mut flow = TransactionValidator::new(kind, "WebUser");
        flow.load(Lookup::Found(item)).unwrap();
        flow
    }

    #[test]
    fn test_withdrawal_over_stock_is_rejected_for_every_stock_level() {
        for kind in [TransactionKind::Out, TransactionKind::Defect] {
            for stock in 0..=20 {
                for extra in 1..=3 {
                    let mut flow = loaded(kind, item(stock, 0));
                    flow.enter_quantity(stock + extra).unwrap();

                    let err = flow.validate().unwrap_err();
                    assert!(matches!(
                        err,
                        CoreError::InsufficientStock { available, requested, .. }
                            if available == stock && requested == stock + extra
                    ));
                    assert_eq!(flow.state().name(), "quantity entered");
                }
            }
        }
    }

    #[test]
    fn test_non_positive_quantity_is_invalid_in_every_state() {
        let mut idle = TransactionValidator::new(TransactionKind::Out, "WebUser");
        let mut with_item = loaded(TransactionKind::Out, item(10, 5));
        let mut validated = loaded(TransactionKind::In, item(10, 5));
        validated.enter_quantity(2).unwrap();
        validated.validate().unwrap();

        for flow in [&mut idle, &mut with_item, &mut validated] {
            let before = flow.state().clone();
            for qty in [0, -1, -100] {
                let err = flow.enter_quantity(qty).unwrap_err();
                assert!(matches!(
                    err,
                    CoreError::Validation(ValidationError::InvalidQuantity { .. })
                ));
            }
            assert_eq!(flow.state(), &before);
        }
    }

    #[test]
    fn test_defect_above_threshold_commits_without_confirmation() {
        let mut flow = loaded(TransactionKind::Defect, item(10, 5));
        flow.enter_quantity(3).unwrap();
        assert_eq!(flow.validate().unwrap(), Validation::Ready);

        let submission = flow.begin_submit(now()).unwrap();
        assert_eq!(submission.transaction.item_barcode, "12345");
        assert_eq!(submission.transaction.kind, TransactionKind::Defect);
        assert_eq!(submission.transaction.quantity, 3);
        assert!(submission.draft.is_none());

        let (item, transaction) = flow.submit_succeeded().unwrap();
        assert_eq!(item.stock, 7);
        assert_eq!(transaction.quantity, 3);
        assert_eq!(flow.state().name(), "committed");
    }

    #[test]
    fn test_defect_below_threshold_requires_confirmation() {
        let mut flow = loaded(TransactionKind::Defect, item(10, 5));
        flow.enter_quantity(7).unwrap();

        let outcome = flow.validate().unwrap();
        assert_eq!(
            outcome,
            Validation::NeedsConfirmation(BelowMinStockWarning {
                barcode: "12345".into(),
                resulting_stock: 3,
                min_stock: 5,
            })
        );

        // Nothing can be submitted until the warning is answered
        assert!(flow.begin_submit(now()).is_err());

        flow.confirm(false).unwrap();
        assert_eq!(flow.state().name(), "quantity entered");
        assert_eq!(flow.item().unwrap().stock(), 10);

        flow.validate().unwrap();
        flow.confirm(true).unwrap();
        assert_eq!(flow.state().name(), "validated");
    }

    #[test]
    fn test_withdrawal_landing_on_threshold_does_not_warn() {
        let mut flow = loaded(TransactionKind::Out, item(10, 5));
        flow.enter_quantity(5).unwrap();
        assert_eq!(flow.validate().unwrap(), Validation::Ready);
    }

    #[test]
    fn test_stock_in_never_asks_for_confirmation() {
        let mut flow = loaded(TransactionKind::In, item(0, 50));
        flow.enter_quantity(1).unwrap();
        assert_eq!(flow.validate().unwrap(), Validation::Ready);
    }

    #[test]
    fn test_not_found_on_withdrawal_returns_to_idle() {
        let mut flow = TransactionValidator::new(TransactionKind::Out, "WebUser");
        let err = flow
            .load(Lookup::NotFound {
                barcode: "00000".into(),
            })
            .unwrap_err();

        assert_eq!(err.to_string(), "Item 00000 is not in stock");
        assert_eq!(flow.state(), &FlowState::Idle);
        assert!(flow.item().is_none());
    }

    #[test]
    fn test_not_found_on_stock_in_loads_editable_draft() {
        let mut flow = TransactionValidator::new(TransactionKind::In, "WebUser");
        let loaded = flow
            .load(Lookup::NotFound {
                barcode: "00000".into(),
            })
            .unwrap();

        match loaded {
            LoadedItem::New(draft) => {
                assert_eq!(draft.barcode, "00000");
                assert!(draft.name.is_empty());
                assert_eq!(draft.min_stock, None);
            }
            other => panic!("expected draft, got {:?}", other),
        }

        flow.edit_draft(DraftEdit {
            name: Some("Hex Nut".into()),
            min_stock: Some(4),
            ..Default::default()
        })
        .unwrap();
        flow.enter_quantity(12).unwrap();
        flow.validate().unwrap();

        let submission = flow.begin_submit(now()).unwrap();
        let draft = submission.draft.unwrap();
        assert_eq!(draft.name, "Hex Nut");
        assert_eq!(draft.min_stock, Some(4));

        let (item, _) = flow.submit_succeeded().unwrap();
        assert_eq!(item.stock, 12);
        assert_eq!(item.min_stock, 4);
    }

    #[test]
    fn test_known_item_min_stock_is_locked() {
        let mut flow = loaded(TransactionKind::In, item(10, 5));
        let err = flow
            .edit_draft(DraftEdit {
                min_stock: Some(1),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::MinStockLocked { .. }));
        assert_eq!(flow.item().unwrap().min_stock(), 5);
    }

    #[test]
    fn test_negative_min_stock_is_rejected() {
        let mut flow = TransactionValidator::new(TransactionKind::In, "WebUser");
        flow.load(Lookup::NotFound {
            barcode: "00000".into(),
        })
        .unwrap();
        let err = flow
            .edit_draft(DraftEdit {
                min_stock: Some(-1),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Negative { .. })));
    }

    #[test]
    fn test_second_submit_is_refused_while_pending() {
        let mut flow = loaded(TransactionKind::Out, item(10, 0));
        flow.enter_quantity(1).unwrap();
        flow.validate().unwrap();
        flow.begin_submit(now()).unwrap();

        assert!(matches!(flow.begin_submit(now()), Err(CoreError::SubmitInFlight)));
        assert!(matches!(flow.enter_quantity(2), Err(CoreError::SubmitInFlight)));
        assert!(matches!(
            flow.load(Lookup::Found(item(3, 0))),
            Err(CoreError::SubmitInFlight)
        ));
        assert!(flow.is_submitting());
    }

    #[test]
    fn test_failed_submit_returns_to_validated_for_retry() {
        let mut flow = loaded(TransactionKind::Out, item(10, 0));
        flow.enter_quantity(4).unwrap();
        flow.validate().unwrap();
        flow.begin_submit(now()).unwrap();

        flow.submit_failed("request timed out").unwrap();
        assert_eq!(flow.state().name(), "validated");
        assert_eq!(flow.quantity(), Some(4));
        assert_eq!(flow.last_failure(), Some("request timed out"));

        // Retry without re-entering anything
        let later = now() + chrono::Duration::seconds(30);
        let retry = flow.begin_submit(later).unwrap();
        assert_eq!(retry.transaction.quantity, 4);
        assert_eq!(retry.transaction.timestamp, Some(now()));
        flow.submit_succeeded().unwrap();
        assert_eq!(flow.last_failure(), None);
    }

    #[test]
    fn test_changed_quantity_after_failure_is_stamped_afresh() {
        let mut flow = loaded(TransactionKind::Out, item(10, 0));
        flow.enter_quantity(4).unwrap();
        flow.validate().unwrap();
        flow.begin_submit(now()).unwrap();
        flow.submit_failed("request timed out").unwrap();

        flow.enter_quantity(3).unwrap();
        flow.validate().unwrap();
        let later = now() + chrono::Duration::seconds(30);
        let submission = flow.begin_submit(later).unwrap();
        assert_eq!(submission.transaction.quantity, 3);
        assert_eq!(submission.transaction.timestamp, Some(later));
    }

    #[test]
    fn test_huge_quantities_never_overflow_stock() {
        let mut flow = loaded(TransactionKind::In, item(1, 0));
        flow.enter_quantity(i64::MAX).unwrap();
        let err = flow.validate().unwrap_err();
        assert!(matches!(
            err,
            CoreError::StockOutOfRange { stock: 1, quantity: i64::MAX, .. }
        ));
        assert!(err.is_input_error());
        assert_eq!(flow.state().name(), "quantity entered");

        // A draft starts from zero, so the largest quantity still fits
        let mut flow = TransactionValidator::new(TransactionKind::In, "WebUser");
        flow.load(Lookup::NotFound { barcode: "NEW-1".into() }).unwrap();
        flow.enter_quantity(i64::MAX).unwrap();
        flow.validate().unwrap();
        flow.begin_submit(now()).unwrap();
        let (created, _) = flow.submit_succeeded().unwrap();
        assert_eq!(created.stock, i64::MAX);

        for kind in [TransactionKind::Out, TransactionKind::Defect] {
            let mut flow = loaded(kind, item(10, 0));
            flow.enter_quantity(i64::MAX).unwrap();
            assert!(matches!(
                flow.validate().unwrap_err(),
                CoreError::InsufficientStock { available: 10, .. }
            ));
        }
    }

    #[test]
    fn test_note_travels_with_defect() {
        let mut flow = loaded(TransactionKind::Defect, item(10, 0));
        flow.set_note(Some("  cracked housing ".into())).unwrap();
        flow.enter_quantity(1).unwrap();
        flow.validate().unwrap();

        let submission = flow.begin_submit(now()).unwrap();
        assert_eq!(submission.transaction.note.as_deref(), Some("cracked housing"));
        assert_eq!(submission.transaction.timestamp, Some(now()));
    }

    #[test]
    fn test_rescan_replaces_loaded_item() {
        let mut flow = loaded(TransactionKind::Out, item(10, 0));
        flow.enter_quantity(2).unwrap();

        flow.load(Lookup::Found(Item::new("999", "Washer", 1, 0))).unwrap();
        assert_eq!(flow.item().unwrap().barcode(), "999");
        assert_eq!(flow.quantity(), None);
    }
}
