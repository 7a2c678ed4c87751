//! Inbound payment-gateway webhook processing.
//!
//! Fails closed on signature problems. Once the signature checks out the
//! gateway always gets a 200: it retries non-2xx deliveries indefinitely, so
//! downstream failures are logged rather than surfaced.

use crate::database::error::DatabaseError;
use crate::database::transaction_repository::{TransactionStore, TxStatus};
use crate::payments::gateway::PaymentGateway;
use crate::payments::types::ChargeEvent;
use crate::services::vending::VendingService;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing signature")]
    MissingSignature,
    #[error("invalid signature")]
    InvalidSignature,
}

pub struct WebhookService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn TransactionStore>,
    vending: Arc<VendingService>,
}

impl WebhookService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn TransactionStore>,
        vending: Arc<VendingService>,
    ) -> Self {
        Self {
            gateway,
            store,
            vending,
        }
    }

    pub async fn process(&self, signature: Option<&str>, body: &[u8]) -> Result<(), WebhookError> {
        let signature = signature.ok_or(WebhookError::MissingSignature)?;
        if !self.gateway.verify_webhook(body, signature) {
            warn!("webhook signature mismatch");
            return Err(WebhookError::InvalidSignature);
        }

        let event = match self.gateway.parse_charge_event(body) {
            Ok(event) => event,
            Err(err) => {
                error!(error = %err, "webhook payload could not be parsed");
                return Ok(());
            }
        };

        info!(
            event_type = %event.event_type,
            reference = event.reference.as_deref().unwrap_or("-"),
            "webhook received"
        );

        if !event.is_charge_success() {
            return Ok(());
        }

        if let Err(err) = self.apply_charge_success(&event).await {
            error!(error = %err, "webhook processing failed");
        }
        Ok(())
    }

    async fn apply_charge_success(&self, event: &ChargeEvent) -> Result<(), DatabaseError> {
        let Some(reference) = event.reference.as_deref() else {
            warn!("charge.success event carried no reference");
            return Ok(());
        };

        let Some(tx) = self.store.find_by_ref(reference).await? else {
            warn!(tx_ref = %reference, "webhook references unknown transaction");
            return Ok(());
        };

        if tx.lifecycle() != Some(TxStatus::Unpaid) {
            info!(
                tx_ref = %reference,
                status = %tx.status,
                "transaction already past UNPAID, webhook is a replay"
            );
            return Ok(());
        }

        let amount_naira = event.amount.map(|kobo| kobo / 100);
        let updated = self
            .store
            .mark_paid(reference, amount_naira, event.status.as_deref())
            .await?;
        if updated.is_some() {
            self.vending
                .notify_status_change(reference, TxStatus::Unpaid, TxStatus::Paid);
        }

        Ok(())
    }
}
