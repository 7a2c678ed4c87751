use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Purchase categories the dispatch engine can fulfill.
///
/// Closed set: adding a category is a compile-checked variant addition, and
/// every `match` over it must name the new arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Data,
    Airtime,
    Electricity,
    Tv,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Data => "data",
            Category::Airtime => "airtime",
            Category::Electricity => "electricity",
            Category::Tv => "tv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "data" => Some(Category::Data),
            "airtime" => Some(Category::Airtime),
            "electricity" => Some(Category::Electricity),
            "tv" => Some(Category::Tv),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category-specific payload supplied by the caller at payment initiation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Network or biller name as chosen in the app, e.g. "MTN", "Ikeja Electric"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Meter number for electricity, smartcard number for TV
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter: Option<String>,
    /// Vendor variation code, e.g. "mtn-1gb" or "dstv-padi"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

/// Wire payload for the vendor's purchase endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendRequest {
    pub request_id: String,
    #[serde(rename = "serviceID")]
    pub service_id: String,
    #[serde(rename = "billersCode")]
    pub billers_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_code: Option<String>,
    pub amount: i64,
    pub phone: String,
}

/// Normalized result of one vendor dispatch attempt.
///
/// Transport failures are folded into `Failure` so a vendor outage lands the
/// transaction in VENDING_FAILED with a readable reason; only infrastructure
/// faults around the dispatch escalate to VENDING_ERROR.
#[derive(Debug, Clone)]
pub enum VendAttempt {
    Success {
        token: Option<String>,
        raw: JsonValue,
    },
    Failure {
        error: String,
        raw: Option<JsonValue>,
    },
}

/// Transport-level errors from the vendor HTTP client.
#[derive(Debug, Clone, Error)]
pub enum VendorError {
    #[error("vendor request failed: {message}")]
    Network { message: String },

    #[error("vendor returned HTTP {status}")]
    Http { status: u16, body: String },

    #[error("invalid vendor response: {message}")]
    InvalidResponse { message: String },
}

impl From<VendorError> for crate::error::AppError {
    fn from(err: VendorError) -> Self {
        use crate::error::{AppError, AppErrorKind, ExternalError};

        let is_retryable = matches!(err, VendorError::Network { .. });
        AppError::new(AppErrorKind::External(ExternalError::Vendor {
            message: err.to_string(),
            is_retryable,
        }))
    }
}
