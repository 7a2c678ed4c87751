//! Category-specific request building and vendor response interpretation.
//!
//! Each category shares one shape: map the caller's network string to a
//! vendor serviceID by case-insensitive substring, build the purchase
//! payload, then read the vendor's response code. Code "000" is success;
//! in sandbox a per-category set of known-broken codes is treated as
//! synthetic success so the rest of the pipeline can be exercised end to end.

use crate::database::transaction_repository::Transaction;
use crate::vending::types::{Category, PurchaseDetails, VendAttempt, VendRequest, VendorError};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

/// Placeholder phone the vendor requires even when the purchase has none.
const PLACEHOLDER_PHONE: &str = "08011111111";

/// Vendor request id: date-time prefix plus a sanitized txRef suffix.
pub fn generate_request_id(tx_ref: &str, now: DateTime<Utc>) -> String {
    let date_part = now.format("%Y%m%d%H%M").to_string();
    let sanitized: String = tx_ref.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let start = sanitized.len().saturating_sub(8);
    format!("{}{}", date_part, &sanitized[start..])
}

/// Map the caller's network/provider string to the vendor serviceID.
pub fn service_id_for(category: Category, network: &str) -> String {
    let n = network.to_lowercase();
    match category {
        Category::Data => {
            if n.contains("mtn") {
                "mtn-data".to_string()
            } else if n.contains("airtel") {
                "airtel-data".to_string()
            } else if n.contains("glo") {
                "glo-data".to_string()
            } else if n.contains("etisalat") || n.contains("9mobile") {
                "etisalat-data".to_string()
            } else {
                format!("{}-data", n)
            }
        }
        Category::Airtime => {
            if n.contains("mtn") {
                "mtn".to_string()
            } else if n.contains("airtel") {
                "airtel".to_string()
            } else if n.contains("glo") {
                "glo".to_string()
            } else if n.contains("etisalat") || n.contains("9mobile") {
                "etisalat".to_string()
            } else {
                n
            }
        }
        Category::Electricity => {
            if n.contains("ikeja") {
                "ikeja-electric".to_string()
            } else {
                "eko-electric".to_string()
            }
        }
        Category::Tv => {
            if n.contains("dstv") {
                "dstv".to_string()
            } else if n.contains("gotv") {
                "gotv".to_string()
            } else if n.contains("startimes") {
                "startimes".to_string()
            } else {
                "showmax".to_string()
            }
        }
    }
}

/// Sandbox soft-failure codes treated as synthetic success per category.
pub fn bypass_codes(category: Category) -> &'static [&'static str] {
    match category {
        Category::Data => &["028", "011", "016"],
        Category::Airtime => &["028", "011"],
        Category::Electricity => &["028", "011"],
        Category::Tv => &["028", "011"],
    }
}

/// Mock token attached to a sandbox-bypassed purchase.
pub fn mock_token(category: Category) -> &'static str {
    match category {
        Category::Data => "MOCK-DATA-BYPASS",
        Category::Airtime => "MOCK-AIRTIME-SUCCESS",
        Category::Electricity => "MOCK-ELEC-BYPASS-TOKEN",
        Category::Tv => "MOCK-TV-SUCCESS",
    }
}

/// Build the vendor purchase payload for a transaction, or a human-readable
/// reason why the stored details cannot be dispatched.
pub fn build_request(
    category: Category,
    tx: &Transaction,
    details: &PurchaseDetails,
    request_id: String,
) -> Result<VendRequest, String> {
    let network = details
        .network
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| "purchase details carry no network/provider name".to_string())?;
    let service_id = service_id_for(category, network);

    match category {
        Category::Data => {
            let phone = required(&details.phone, "phone number")?;
            let product = required(&details.product_id, "product code")?;
            Ok(VendRequest {
                request_id,
                service_id,
                billers_code: phone.clone(),
                variation_code: Some(product),
                amount: tx.amount,
                phone,
            })
        }
        Category::Airtime => {
            let phone = required(&details.phone, "phone number")?;
            Ok(VendRequest {
                request_id,
                service_id,
                billers_code: phone.clone(),
                variation_code: None,
                amount: tx.amount,
                phone,
            })
        }
        Category::Electricity => {
            let meter = required(&details.meter, "meter number")?;
            Ok(VendRequest {
                request_id,
                service_id,
                billers_code: meter,
                variation_code: Some("prepaid".to_string()),
                amount: tx.amount,
                phone: phone_or_placeholder(details),
            })
        }
        Category::Tv => {
            let smartcard = details
                .meter
                .clone()
                .or_else(|| details.phone.clone())
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| "tv purchase requires a smartcard number".to_string())?;
            let product = required(&details.product_id, "product code")?;
            Ok(VendRequest {
                request_id,
                service_id,
                billers_code: smartcard,
                variation_code: Some(product),
                amount: tx.amount,
                phone: phone_or_placeholder(details),
            })
        }
    }
}

fn required(value: &Option<String>, what: &str) -> Result<String, String> {
    value
        .clone()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| format!("purchase details carry no {}", what))
}

fn phone_or_placeholder(details: &PurchaseDetails) -> String {
    details
        .phone
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| PLACEHOLDER_PHONE.to_string())
}

fn response_code(raw: &JsonValue) -> String {
    match raw.get("code") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Interpret a vendor response body into a success or failure.
pub fn interpret_response(category: Category, mut raw: JsonValue, sandbox: bool) -> VendAttempt {
    let code = response_code(&raw);

    if code == "000" {
        let token = match category {
            Category::Electricity => Some(extract_electricity_token(&raw)),
            _ => None,
        };
        return VendAttempt::Success { token, raw };
    }

    if sandbox && bypass_codes(category).contains(&code.as_str()) {
        if let Some(obj) = raw.as_object_mut() {
            obj.insert(
                "response_description".to_string(),
                JsonValue::String(format!("SANDBOX BYPASS ({})", code)),
            );
        }
        return VendAttempt::Success {
            token: Some(mock_token(category).to_string()),
            raw,
        };
    }

    let error = raw
        .get("response_description")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Vendor Error {}", code));

    VendAttempt::Failure {
        error,
        raw: Some(raw),
    }
}

/// Purchased electricity token, read from the fields the vendor has been
/// observed to use, with a sandbox placeholder fallback.
pub fn extract_electricity_token(raw: &JsonValue) -> String {
    raw.get("purchased_code")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .or_else(|| {
            raw.get("content")
                .and_then(|c| c.get("purchased_code"))
                .and_then(|v| v.as_str())
                .and_then(|s| s.split(':').nth(1))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .or_else(|| {
            raw.get("mainToken")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "TEST-TOKEN-SANDBOX".to_string())
}

/// Fold a transport error into a dispatch failure, preferring the vendor's
/// structured error description when the body carries one.
pub fn failure_from_vendor_error(err: VendorError) -> VendAttempt {
    match err {
        VendorError::Http { status, body } => {
            let raw = serde_json::from_str::<JsonValue>(&body).ok();
            let error = raw
                .as_ref()
                .and_then(|v| v.get("response_description"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("vendor request failed with HTTP {}", status));
            VendAttempt::Failure { error, raw }
        }
        other => VendAttempt::Failure {
            error: other.to_string(),
            raw: None,
        },
    }
}
