//! Data plan catalog with a 24-hour persisted cache, plus the curated
//! hot-deals list shown on the dashboard.

use crate::database::error::DatabaseError;
use crate::database::plan_cache_repository::PlanCacheStore;
use crate::error::{AppError, AppErrorKind, AppResult, DomainError};
use crate::vending::types::VendorError;
use crate::vending::vtpass::VendorApi;
use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

pub const CACHE_TTL_HOURS: i64 = 24;

/// A normalized data product offered to the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPlan {
    pub id: String,
    pub name: String,
    pub price: i64,
    pub validity: String,
    pub category: String,
    pub provider_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataPlansResponse {
    pub success: bool,
    pub plans: Vec<DataPlan>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotDeal {
    pub id: &'static str,
    pub provider: &'static str,
    pub plan: &'static str,
    pub price: &'static str,
    pub original_price: &'static str,
    pub validity: &'static str,
    pub color: &'static str,
    pub category: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HotDealsResponse {
    pub success: bool,
    pub deals: Vec<HotDeal>,
}

/// Caller-facing provider id -> vendor serviceID.
pub fn service_id_for_provider(provider: &str) -> Option<&'static str> {
    match provider.to_lowercase().as_str() {
        "mtn" => Some("mtn-data"),
        "airtel" => Some("airtel-data"),
        "glo" => Some("glo-data"),
        "9mobile" => Some("etisalat-data"),
        "smile" => Some("smile-direct"),
        "spectranet" => Some("spectranet"),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
enum PlanFetchError {
    #[error(transparent)]
    Store(#[from] DatabaseError),
    #[error(transparent)]
    Vendor(#[from] VendorError),
    #[error("vendor catalog response carried no variations")]
    EmptyCatalog,
}

pub struct PlanService {
    cache: Arc<dyn PlanCacheStore>,
    vendor: Arc<dyn VendorApi>,
}

impl PlanService {
    pub fn new(cache: Arc<dyn PlanCacheStore>, vendor: Arc<dyn VendorApi>) -> Self {
        Self { cache, vendor }
    }

    /// Unknown providers are a caller error; every other failure degrades to
    /// an empty list so the app can fall back to its static catalog.
    pub async fn get_data_plans(&self, provider: &str) -> AppResult<DataPlansResponse> {
        let key = provider.trim().to_lowercase();
        let service_id = service_id_for_provider(&key).ok_or_else(|| {
            AppError::new(AppErrorKind::Domain(DomainError::UnsupportedProvider {
                provider: provider.to_string(),
            }))
        })?;

        match self.load_plans(&key, service_id).await {
            Ok(plans) => Ok(DataPlansResponse {
                success: true,
                plans,
            }),
            Err(err) => {
                warn!(provider = %key, error = %err, "data plan fetch failed, returning empty list");
                Ok(DataPlansResponse {
                    success: false,
                    plans: Vec::new(),
                })
            }
        }
    }

    async fn load_plans(
        &self,
        provider: &str,
        service_id: &str,
    ) -> Result<Vec<DataPlan>, PlanFetchError> {
        if let Some(entry) = self.cache.get(provider).await? {
            let age = Utc::now() - entry.last_updated;
            if age < Duration::hours(CACHE_TTL_HOURS) {
                let cached: Vec<DataPlan> =
                    serde_json::from_value(entry.plans.clone()).unwrap_or_default();
                if !cached.is_empty() {
                    info!(provider = %provider, "returning cached data plans");
                    return Ok(cached);
                }
            }
        }

        info!(provider = %provider, service_id = %service_id, "fetching fresh data plans from vendor");
        let raw = self.vendor.service_variations(service_id).await?;
        let plans = normalize_catalog(provider, &raw).ok_or(PlanFetchError::EmptyCatalog)?;

        let plans_json = serde_json::to_value(&plans).unwrap_or_else(|_| JsonValue::Array(vec![]));
        self.cache.upsert(provider, &plans_json).await?;
        info!(provider = %provider, count = plans.len(), "data plan cache updated");

        Ok(plans)
    }

    /// Manually curated competitive deals for the dashboard.
    pub fn hot_deals(&self) -> HotDealsResponse {
        HotDealsResponse {
            success: true,
            deals: vec![
                HotDeal {
                    id: "mtn-1gb-sme",
                    provider: "MTN",
                    plan: "1GB SME",
                    price: "₦260",
                    original_price: "₦1,200",
                    validity: "30 Days",
                    color: "#eab308",
                    category: "data",
                },
                HotDeal {
                    id: "airtel-1.5gb",
                    provider: "Airtel",
                    plan: "1.5GB Data",
                    price: "₦950",
                    original_price: "₦1,000",
                    validity: "30 Days",
                    color: "#ef4444",
                    category: "data",
                },
                HotDeal {
                    id: "glo-2.5gb",
                    provider: "Glo",
                    plan: "2.5GB Data",
                    price: "₦980",
                    original_price: "₦1,000",
                    validity: "30 Days",
                    color: "#10b981",
                    category: "data",
                },
                HotDeal {
                    id: "mtn-2gb-sme",
                    provider: "MTN",
                    plan: "2GB SME",
                    price: "₦520",
                    original_price: "₦2,400",
                    validity: "30 Days",
                    color: "#eab308",
                    category: "data",
                },
            ],
        }
    }
}

/// Turn a raw vendor catalog response into normalized plans. `None` when the
/// response code is not the success sentinel or no variation list is present.
fn normalize_catalog(provider: &str, raw: &JsonValue) -> Option<Vec<DataPlan>> {
    let code_ok = raw
        .get("response_description")
        .and_then(|v| v.as_str())
        .map(|s| s == "000")
        .unwrap_or(false);
    if !code_ok {
        return None;
    }

    // The vendor has shipped both spellings of this key.
    let content = raw.get("content")?;
    let variations = content
        .get("variations")
        .or_else(|| content.get("varations"))?
        .as_array()?;

    let mut seen = HashSet::new();
    let mut plans = Vec::new();
    for variation in variations {
        let Some(code) = variation.get("variation_code").and_then(|v| v.as_str()) else {
            continue;
        };
        if !seen.insert(code.to_string()) {
            continue;
        }

        let name = variation
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let amount = match variation.get("variation_amount") {
            Some(JsonValue::String(s)) => s.parse::<f64>().unwrap_or(0.0),
            Some(JsonValue::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        };

        plans.push(DataPlan {
            id: code.to_string(),
            name: clean_plan_name(name),
            price: amount.round() as i64,
            validity: validity_label(name),
            category: "data".to_string(),
            provider_id: provider.to_string(),
        });
    }

    Some(plans)
}

/// Derive a validity label from the vendor's free-text plan name.
pub fn validity_label(name: &str) -> String {
    let n = name.to_lowercase();
    let label = if n.contains("24 hrs") || n.contains("1 day") || n.contains("daily") {
        "1 Day"
    } else if n.contains("2 days") {
        "2 Days"
    } else if n.contains("7 days") || n.contains("weekly") || n.contains("1 week") {
        "7 Days"
    } else if n.contains("14 days") || n.contains("2 weeks") {
        "14 Days"
    } else {
        // "30 days", "monthly", "1 month" and everything unrecognized
        "30 Days"
    };
    label.to_string()
}

/// Extract a clean "NNN MB/GB" label from the vendor's free-text name,
/// falling back to the raw name.
pub fn clean_plan_name(name: &str) -> String {
    static SIZE_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = SIZE_PATTERN
        .get_or_init(|| Regex::new(r"(?i)(\d+(?:\.\d+)?(?:MB|GB))").expect("valid size pattern"));

    pattern
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| name.to_string())
}
