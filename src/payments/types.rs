use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Inputs for creating a hosted checkout session with the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    /// Whole-naira amount; the client converts to kobo on the wire.
    pub amount: i64,
    pub reference: String,
    pub category: String,
    pub provider: Option<String>,
    pub phone: Option<String>,
    pub user_id: String,
}

/// A created hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Gateway-reported state of a charge, as returned by verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCharge {
    /// Amount in the gateway's minor unit (kobo).
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub channel: Option<String>,
    pub paid_at: Option<String>,
    pub gateway_response: Option<String>,
}

impl GatewayCharge {
    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }

    /// Gateway amount converted back to whole naira.
    pub fn amount_in_naira(&self) -> i64 {
        self.amount / 100
    }
}

/// A parsed inbound webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeEvent {
    pub event_type: String,
    pub reference: Option<String>,
    pub status: Option<String>,
    /// Amount in kobo, when the event carries one.
    pub amount: Option<i64>,
    pub payload: JsonValue,
}

impl ChargeEvent {
    pub fn is_charge_success(&self) -> bool {
        self.event_type == "charge.success"
    }
}
