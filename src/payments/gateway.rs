use crate::payments::error::PaymentResult;
use crate::payments::types::{ChargeEvent, CheckoutRequest, CheckoutSession, GatewayCharge};
use async_trait::async_trait;

/// Seam between the transaction engine and the payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session for the given reference.
    async fn initialize_checkout(&self, request: CheckoutRequest)
        -> PaymentResult<CheckoutSession>;

    /// Look up the charge state for a reference.
    async fn verify_charge(&self, reference: &str) -> PaymentResult<GatewayCharge>;

    /// Validate an inbound webhook signature against the shared secret.
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> bool;

    /// Parse an inbound webhook body into a charge event.
    fn parse_charge_event(&self, payload: &[u8]) -> PaymentResult<ChargeEvent>;
}
