//! Transaction lifecycle owner: observes status changes, fires the vendor
//! dispatch exactly once per UNPAID -> PAID edge, and records the outcome.

use crate::database::error::DatabaseError;
use crate::database::transaction_repository::{TransactionStore, TxStatus};
use crate::vending::engine::DispatchEngine;
use crate::vending::types::{Category, VendAttempt};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Infrastructure faults around the dispatch. Adapter/vendor rejections are
/// not errors: they land in VENDING_FAILED through the normal outcome path.
#[derive(Debug, Error)]
pub enum VendingError {
    #[error("store error during vending: {0}")]
    Store(#[from] DatabaseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No record matches the reference; nothing to fulfill.
    NotFound,
    /// Record is already VENDED (duplicate trigger fire).
    AlreadyVended,
    /// Another invocation holds the DISPATCHING claim.
    AlreadyClaimed,
    /// Stored category is outside the supported set; configuration error,
    /// record left untouched.
    UnknownCategory,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::NotFound => "not_found",
            SkipReason::AlreadyVended => "already_vended",
            SkipReason::AlreadyClaimed => "already_claimed",
            SkipReason::UnknownCategory => "unknown_category",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub enum VendOutcome {
    /// Vendor accepted the purchase; record is VENDED.
    Completed { token: Option<String> },
    /// Vendor rejected the purchase; record is VENDING_FAILED.
    Rejected { error: String },
    /// Nothing was dispatched and no state was written.
    Skipped(SkipReason),
}

/// Strict PAID edge detector: fires only on a transition INTO PAID, never on
/// unrelated writes to an already-PAID record.
pub fn paid_edge(previous: TxStatus, current: TxStatus) -> bool {
    previous != TxStatus::Paid && current == TxStatus::Paid
}

#[derive(Clone)]
pub struct VendingService {
    store: Arc<dyn TransactionStore>,
    engine: DispatchEngine,
}

impl VendingService {
    pub fn new(store: Arc<dyn TransactionStore>, engine: DispatchEngine) -> Self {
        Self { store, engine }
    }

    /// Update-observer entry point. Every status writer reports the
    /// `(previous, current)` pair here; only a PAID edge starts the vending
    /// step, in the background so the writer's request is not held up.
    pub fn notify_status_change(&self, tx_ref: &str, previous: TxStatus, current: TxStatus) {
        if !paid_edge(previous, current) {
            debug!(
                tx_ref = %tx_ref,
                previous = %previous,
                current = %current,
                "status change is not a PAID edge, skipping vending"
            );
            return;
        }

        info!(tx_ref = %tx_ref, "PAID edge observed, starting vending engine");

        let service = self.clone();
        let tx_ref = tx_ref.to_string();
        tokio::spawn(async move {
            match service.handle_vending(&tx_ref).await {
                Ok(outcome) => {
                    info!(tx_ref = %tx_ref, outcome = ?outcome, "vending step completed");
                }
                Err(err) => {
                    error!(tx_ref = %tx_ref, error = %err, "critical error in vending engine");
                    if let Err(mark_err) = service.store.mark_vending_error(&tx_ref).await {
                        error!(
                            tx_ref = %tx_ref,
                            error = %mark_err,
                            "failed to record VENDING_ERROR state"
                        );
                    }
                }
            }
        });
    }

    /// The vending step. Loads, guards, claims, dispatches, records.
    ///
    /// The PAID -> DISPATCHING claim is a conditional write: of any number of
    /// concurrent invocations for one reference, exactly one reaches the
    /// vendor; the rest observe a lost claim and no-op.
    pub async fn handle_vending(&self, tx_ref: &str) -> Result<VendOutcome, VendingError> {
        let Some(tx) = self.store.find_by_ref(tx_ref).await? else {
            warn!(tx_ref = %tx_ref, "transaction not found for vending");
            return Ok(VendOutcome::Skipped(SkipReason::NotFound));
        };

        if tx.lifecycle() == Some(TxStatus::Vended) {
            return Ok(VendOutcome::Skipped(SkipReason::AlreadyVended));
        }

        let Some(category) = Category::parse(&tx.category) else {
            error!(tx_ref = %tx_ref, category = %tx.category, "unknown purchase category");
            return Ok(VendOutcome::Skipped(SkipReason::UnknownCategory));
        };

        let Some(claimed) = self.store.claim_for_dispatch(tx_ref).await? else {
            debug!(tx_ref = %tx_ref, "dispatch already claimed for this transaction");
            return Ok(VendOutcome::Skipped(SkipReason::AlreadyClaimed));
        };

        match self.engine.dispatch(category, &claimed).await {
            VendAttempt::Success { token, raw } => {
                self.store
                    .mark_vended(tx_ref, token.as_deref(), &raw)
                    .await?;
                info!(tx_ref = %tx_ref, category = %category, "successfully vended");
                Ok(VendOutcome::Completed { token })
            }
            VendAttempt::Failure { error, raw } => {
                self.store
                    .mark_vending_failed(tx_ref, &error, raw.as_ref())
                    .await?;
                warn!(tx_ref = %tx_ref, error = %error, "vending failed");
                Ok(VendOutcome::Rejected { error })
            }
        }
    }
}
