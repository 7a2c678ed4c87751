//! Payment lifecycle operations: initialization, verification, and the
//! development-only mock confirmation bypass.

use crate::database::transaction_repository::{NewTransaction, TransactionStore, TxStatus};
use crate::error::{AppError, AppErrorKind, AppResult, ValidationError};
use crate::payments::gateway::PaymentGateway;
use crate::payments::types::CheckoutRequest;
use crate::services::vending::VendingService;
use crate::vending::types::{Category, PurchaseDetails};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

const TX_REF_PREFIX: &str = "SWFT";
const DEFAULT_CHECKOUT_EMAIL: &str = "user@swift.app";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPaymentInput {
    pub category: Option<String>,
    pub amount: Option<i64>,
    pub details: Option<PurchaseDetails>,
    pub provider: Option<String>,
    pub payment_method: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPaymentResponse {
    pub success: bool,
    pub tx_ref: String,
    pub checkout_url: String,
    pub access_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MockConfirmResponse {
    pub success: bool,
    pub message: String,
}

pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn TransactionStore>,
    vending: Arc<VendingService>,
}

impl PaymentService {
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

    /// `<prefix>-<millis>-<random>`, unique enough to double as the
    /// gateway's external reference.
    pub fn generate_tx_ref() -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen_range(0..1000);
        format!("{}-{}-{}", TX_REF_PREFIX, millis, suffix)
    }

    pub async fn init_payment(&self, input: InitPaymentInput) -> AppResult<InitPaymentResponse> {
        // Validation happens before any record or gateway call.
        let category_raw = input
            .category
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::missing_field("category"))?;
        let category = Category::parse(&category_raw).ok_or_else(|| {
            AppError::new(AppErrorKind::Validation(ValidationError::InvalidCategory {
                category: category_raw.clone(),
            }))
        })?;
        let amount = input
            .amount
            .ok_or_else(|| AppError::missing_field("amount"))?;
        if amount <= 0 {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::InvalidAmount {
                    amount,
                    reason: "amount must be greater than zero".to_string(),
                },
            )));
        }
        let details = input
            .details
            .ok_or_else(|| AppError::missing_field("details"))?;

        let tx_ref = Self::generate_tx_ref();
        let user_id = input
            .user_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "anonymous".to_string());
        let payment_method = input
            .payment_method
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "card".to_string());

        // The UNPAID record is written before the gateway is involved and is
        // never rolled back: a failed initialization still leaves an
        // auditable trail.
        let details_json =
            serde_json::to_value(&details).unwrap_or_else(|_| serde_json::json!({}));
        self.store
            .create(NewTransaction {
                tx_ref: tx_ref.clone(),
                user_id: user_id.clone(),
                category: category.as_str().to_string(),
                amount,
                details: details_json,
                provider: input.provider.clone(),
                payment_method,
            })
            .await?;

        info!(tx_ref = %tx_ref, category = %category, amount, "initiating payment");

        let session = self
            .gateway
            .initialize_checkout(CheckoutRequest {
                email: input
                    .email
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_CHECKOUT_EMAIL.to_string()),
                amount,
                reference: tx_ref.clone(),
                category: category.as_str().to_string(),
                provider: input.provider,
                phone: details.phone.clone().or_else(|| details.meter.clone()),
                user_id,
            })
            .await
            .map_err(|e| {
                error!(tx_ref = %tx_ref, error = %e, "payment initialization failed");
                AppError::from(e)
            })?;

        self.store
            .record_checkout_session(&tx_ref, &session.access_code, &session.reference)
            .await?;

        Ok(InitPaymentResponse {
            success: true,
            tx_ref,
            checkout_url: session.checkout_url,
            access_code: session.access_code,
        })
    }

    pub async fn verify_payment(&self, tx_ref: &str) -> AppResult<VerifyPaymentResponse> {
        if tx_ref.trim().is_empty() {
            return Err(AppError::missing_field("txRef"));
        }

        let charge = self.gateway.verify_charge(tx_ref).await.map_err(|e| {
            // Opaque to the caller; the gateway detail stays in the log.
            error!(tx_ref = %tx_ref, error = %e, "gateway verification failed");
            AppError::from(e)
        })?;

        if charge.is_successful() {
            let tx = self
                .store
                .find_by_ref(tx_ref)
                .await?
                .ok_or_else(|| AppError::transaction_not_found(tx_ref))?;

            if tx.lifecycle() == Some(TxStatus::Unpaid) {
                let updated = self
                    .store
                    .mark_paid(tx_ref, Some(charge.amount_in_naira()), Some(&charge.status))
                    .await?;
                if updated.is_some() {
                    self.vending
                        .notify_status_change(tx_ref, TxStatus::Unpaid, TxStatus::Paid);
                }
                // A lost race means a concurrent writer just applied PAID;
                // either way the record is paid now.
                return Ok(VerifyPaymentResponse {
                    success: true,
                    status: TxStatus::Paid.as_str().to_string(),
                });
            }

            // Already past UNPAID: idempotent read, nothing mutated.
            return Ok(VerifyPaymentResponse {
                success: true,
                status: tx.status,
            });
        }

        Ok(VerifyPaymentResponse {
            success: false,
            status: if charge.status.is_empty() {
                "failed".to_string()
            } else {
                charge.status
            },
        })
    }

    /// Development bypass: force UNPAID -> PAID without touching the gateway.
    /// The route is only mounted when ENABLE_MOCK_PAYMENTS is set.
    pub async fn confirm_mock_payment(&self, tx_ref: &str) -> AppResult<MockConfirmResponse> {
        if tx_ref.trim().is_empty() {
            return Err(AppError::missing_field("txRef"));
        }

        info!(tx_ref = %tx_ref, "triggering mock payment bypass");

        if self.store.find_by_ref(tx_ref).await?.is_none() {
            error!(tx_ref = %tx_ref, "mock confirmation failed: transaction not found");
            return Err(AppError::transaction_not_found(tx_ref));
        }

        if self.store.force_paid(tx_ref).await?.is_some() {
            self.vending
                .notify_status_change(tx_ref, TxStatus::Unpaid, TxStatus::Paid);
        }

        info!(tx_ref = %tx_ref, "transaction marked as PAID via mock bypass");
        Ok(MockConfirmResponse {
            success: true,
            message: "Mock payment confirmed.".to_string(),
        })
    }
}
