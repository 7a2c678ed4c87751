//! Data plan cache freshness and degradation behavior.

mod common;

use common::{InMemoryPlanCache, MockVendor};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use swiftpay_backend::error::ErrorCode;
use swiftpay_backend::services::plans::{DataPlan, PlanService};
use swiftpay_backend::vending::types::VendorError;

fn seeded_plans() -> serde_json::Value {
    serde_json::to_value(vec![DataPlan {
        id: "mtn-1gb".to_string(),
        name: "1GB".to_string(),
        price: 260,
        validity: "30 Days".to_string(),
        category: "data".to_string(),
        provider_id: "mtn".to_string(),
    }])
    .unwrap()
}

fn vendor_catalog() -> serde_json::Value {
    serde_json::json!({
        "response_description": "000",
        "content": {
            "variations": [
                {"variation_code": "mtn-2gb", "name": "MTN 2GB Monthly", "variation_amount": "520.00"}
            ]
        }
    })
}

#[tokio::test]
async fn fresh_cache_is_served_without_a_vendor_fetch() {
    let cache = Arc::new(InMemoryPlanCache::new());
    cache.seed("mtn", seeded_plans(), 1).await;
    let vendor = Arc::new(MockVendor::new(true, serde_json::Value::Null).with_variations(vendor_catalog()));
    let service = PlanService::new(cache, vendor.clone());

    let first = service.get_data_plans("mtn").await.expect("plans");
    let second = service.get_data_plans("mtn").await.expect("plans");

    assert!(first.success && second.success);
    assert_eq!(first.plans, second.plans, "repeat call returns identical plans");
    assert_eq!(first.plans[0].id, "mtn-1gb");
    assert_eq!(
        vendor.variation_calls.load(Ordering::SeqCst),
        0,
        "fresh cache must not hit the vendor"
    );
}

#[tokio::test]
async fn stale_cache_triggers_exactly_one_fresh_fetch() {
    let cache = Arc::new(InMemoryPlanCache::new());
    cache.seed("mtn", seeded_plans(), 25).await;
    let vendor = Arc::new(MockVendor::new(true, serde_json::Value::Null).with_variations(vendor_catalog()));
    let service = PlanService::new(cache, vendor.clone());

    let refreshed = service.get_data_plans("mtn").await.expect("plans");
    assert!(refreshed.success);
    assert_eq!(refreshed.plans[0].id, "mtn-2gb");
    assert_eq!(vendor.variation_calls.load(Ordering::SeqCst), 1);

    // Now cached fresh; the follow-up call is served locally.
    let cached = service.get_data_plans("mtn").await.expect("plans");
    assert_eq!(cached.plans, refreshed.plans);
    assert_eq!(vendor.variation_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_cached_list_is_treated_as_a_miss() {
    let cache = Arc::new(InMemoryPlanCache::new());
    cache.seed("mtn", serde_json::json!([]), 1).await;
    let vendor = Arc::new(MockVendor::new(true, serde_json::Value::Null).with_variations(vendor_catalog()));
    let service = PlanService::new(cache, vendor.clone());

    let refreshed = service.get_data_plans("mtn").await.expect("plans");
    assert!(refreshed.success);
    assert_eq!(vendor.variation_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_provider_is_an_invalid_argument() {
    let cache = Arc::new(InMemoryPlanCache::new());
    let vendor = Arc::new(MockVendor::new(true, serde_json::Value::Null));
    let service = PlanService::new(cache, vendor);

    let err = service
        .get_data_plans("starlink")
        .await
        .expect_err("unsupported provider must fail");
    assert_eq!(err.error_code(), ErrorCode::UnsupportedProvider);
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn vendor_failure_degrades_to_an_empty_list() {
    let cache = Arc::new(InMemoryPlanCache::new());
    let vendor = Arc::new(
        MockVendor::new(true, serde_json::Value::Null).with_variations_error(
            VendorError::Network {
                message: "connection timed out".to_string(),
            },
        ),
    );
    let service = PlanService::new(cache, vendor);

    let result = service.get_data_plans("mtn").await.expect("degrades, never throws");
    assert!(!result.success);
    assert!(result.plans.is_empty());
}

#[tokio::test]
async fn hot_deals_are_static_and_always_succeed() {
    let cache = Arc::new(InMemoryPlanCache::new());
    let vendor = Arc::new(MockVendor::new(true, serde_json::Value::Null));
    let service = PlanService::new(cache, vendor);

    let deals = service.hot_deals();
    assert!(deals.success);
    assert_eq!(deals.deals.len(), 4);
    assert!(deals.deals.iter().all(|d| d.category == "data"));
}
