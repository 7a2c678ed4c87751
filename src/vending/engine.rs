use crate::database::transaction_repository::Transaction;
use crate::vending::adapters;
use crate::vending::types::{Category, PurchaseDetails, VendAttempt};
use crate::vending::vtpass::VendorApi;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Routes a paid transaction to its category adapter and normalizes the
/// vendor's answer into a [`VendAttempt`].
#[derive(Clone)]
pub struct DispatchEngine {
    vendor: Arc<dyn VendorApi>,
}

impl DispatchEngine {
    pub fn new(vendor: Arc<dyn VendorApi>) -> Self {
        Self { vendor }
    }

    pub async fn dispatch(&self, category: Category, tx: &Transaction) -> VendAttempt {
        let details: PurchaseDetails =
            serde_json::from_value(tx.details.clone()).unwrap_or_default();
        let request_id = adapters::generate_request_id(&tx.tx_ref, Utc::now());

        let request = match adapters::build_request(category, tx, &details, request_id) {
            Ok(request) => request,
            Err(reason) => {
                warn!(tx_ref = %tx.tx_ref, category = %category, reason = %reason,
                    "transaction cannot be dispatched");
                return VendAttempt::Failure {
                    error: reason,
                    raw: None,
                };
            }
        };

        info!(
            tx_ref = %tx.tx_ref,
            category = %category,
            service_id = %request.service_id,
            amount = request.amount,
            "dispatching vendor purchase"
        );

        match self.vendor.pay(&request).await {
            Ok(raw) => adapters::interpret_response(category, raw, self.vendor.is_sandbox()),
            Err(err) => {
                warn!(tx_ref = %tx.tx_ref, error = %err, "vendor purchase call failed");
                adapters::failure_from_vendor_error(err)
            }
        }
    }
}
