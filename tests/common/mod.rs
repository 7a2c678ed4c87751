//! Shared test doubles: an in-memory transaction store with the same
//! conditional-update semantics as the Postgres repository, plus scripted
//! gateway and vendor implementations.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use swiftpay_backend::database::error::DatabaseError;
use swiftpay_backend::database::plan_cache_repository::{PlanCacheEntry, PlanCacheStore};
use swiftpay_backend::database::transaction_repository::{
    NewTransaction, Transaction, TransactionStore,
};
use swiftpay_backend::payments::error::{PaymentError, PaymentResult};
use swiftpay_backend::payments::gateway::PaymentGateway;
use swiftpay_backend::payments::signature::verify_hmac_sha512_hex;
use swiftpay_backend::payments::types::{
    ChargeEvent, CheckoutRequest, CheckoutSession, GatewayCharge,
};
use swiftpay_backend::vending::types::{VendRequest, VendorError};
use swiftpay_backend::vending::vtpass::VendorApi;

// ---------------------------------------------------------------------------
// In-memory transaction store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<HashMap<String, Transaction>>,
    pub create_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, tx_ref: &str) -> Option<Transaction> {
        self.rows.lock().await.get(tx_ref).cloned()
    }

    pub async fn status_of(&self, tx_ref: &str) -> Option<String> {
        self.get(tx_ref).await.map(|t| t.status)
    }

    pub async fn row_count(&self) -> usize {
        self.rows.lock().await.len()
    }
}

fn blank_transaction(new: NewTransaction) -> Transaction {
    let now = Utc::now();
    Transaction {
        tx_ref: new.tx_ref,
        user_id: new.user_id,
        category: new.category,
        amount: new.amount,
        details: new.details,
        provider: new.provider,
        payment_method: new.payment_method,
        status: "UNPAID".to_string(),
        paystack_access_code: None,
        paystack_reference: None,
        paystack_amount: None,
        paystack_status: None,
        verification_method: None,
        paid_at: None,
        vended_at: None,
        token: None,
        vendor_response: None,
        error_message: None,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn create(&self, new: NewTransaction) -> Result<Transaction, DatabaseError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&new.tx_ref) {
            return Err(DatabaseError::UniqueViolation {
                constraint: "transactions_pkey".to_string(),
            });
        }
        let tx = blank_transaction(new);
        rows.insert(tx.tx_ref.clone(), tx.clone());
        Ok(tx)
    }

    async fn find_by_ref(&self, tx_ref: &str) -> Result<Option<Transaction>, DatabaseError> {
        Ok(self.rows.lock().await.get(tx_ref).cloned())
    }

    async fn record_checkout_session(
        &self,
        tx_ref: &str,
        access_code: &str,
        gateway_reference: &str,
    ) -> Result<Transaction, DatabaseError> {
        let mut rows = self.rows.lock().await;
        let tx = rows.get_mut(tx_ref).ok_or(DatabaseError::NotFound)?;
        tx.paystack_access_code = Some(access_code.to_string());
        tx.paystack_reference = Some(gateway_reference.to_string());
        tx.updated_at = Utc::now();
        Ok(tx.clone())
    }

    async fn mark_paid(
        &self,
        tx_ref: &str,
        gateway_amount: Option<i64>,
        gateway_status: Option<&str>,
    ) -> Result<Option<Transaction>, DatabaseError> {
        let mut rows = self.rows.lock().await;
        let Some(tx) = rows.get_mut(tx_ref) else {
            return Ok(None);
        };
        if tx.status != "UNPAID" {
            return Ok(None);
        }
        tx.status = "PAID".to_string();
        tx.paid_at = Some(Utc::now());
        tx.paystack_amount = gateway_amount;
        tx.paystack_status = gateway_status.map(|s| s.to_string());
        tx.updated_at = Utc::now();
        Ok(Some(tx.clone()))
    }

    async fn force_paid(&self, tx_ref: &str) -> Result<Option<Transaction>, DatabaseError> {
        let mut rows = self.rows.lock().await;
        let Some(tx) = rows.get_mut(tx_ref) else {
            return Ok(None);
        };
        if tx.status != "UNPAID" {
            return Ok(None);
        }
        tx.status = "PAID".to_string();
        tx.paid_at = Some(Utc::now());
        tx.payment_method = "mock-test-bypass".to_string();
        tx.verification_method = Some("manual_bypass".to_string());
        tx.updated_at = Utc::now();
        Ok(Some(tx.clone()))
    }

    async fn claim_for_dispatch(
        &self,
        tx_ref: &str,
    ) -> Result<Option<Transaction>, DatabaseError> {
        let mut rows = self.rows.lock().await;
        let Some(tx) = rows.get_mut(tx_ref) else {
            return Ok(None);
        };
        if tx.status != "PAID" {
            return Ok(None);
        }
        tx.status = "DISPATCHING".to_string();
        tx.updated_at = Utc::now();
        Ok(Some(tx.clone()))
    }

    async fn mark_vended(
        &self,
        tx_ref: &str,
        token: Option<&str>,
        vendor_response: &JsonValue,
    ) -> Result<Transaction, DatabaseError> {
        let mut rows = self.rows.lock().await;
        let tx = rows.get_mut(tx_ref).ok_or(DatabaseError::NotFound)?;
        tx.status = "VENDED".to_string();
        tx.vended_at = Some(Utc::now());
        tx.token = token.map(|s| s.to_string());
        tx.vendor_response = Some(vendor_response.clone());
        tx.updated_at = Utc::now();
        Ok(tx.clone())
    }

    async fn mark_vending_failed(
        &self,
        tx_ref: &str,
        error: &str,
        vendor_response: Option<&JsonValue>,
    ) -> Result<Transaction, DatabaseError> {
        let mut rows = self.rows.lock().await;
        let tx = rows.get_mut(tx_ref).ok_or(DatabaseError::NotFound)?;
        tx.status = "VENDING_FAILED".to_string();
        tx.error_message = Some(error.to_string());
        if let Some(raw) = vendor_response {
            tx.vendor_response = Some(raw.clone());
        }
        tx.updated_at = Utc::now();
        Ok(tx.clone())
    }

    async fn mark_vending_error(&self, tx_ref: &str) -> Result<Transaction, DatabaseError> {
        let mut rows = self.rows.lock().await;
        let tx = rows.get_mut(tx_ref).ok_or(DatabaseError::NotFound)?;
        tx.status = "VENDING_ERROR".to_string();
        tx.updated_at = Utc::now();
        Ok(tx.clone())
    }
}

// ---------------------------------------------------------------------------
// In-memory plan cache
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryPlanCache {
    entries: Mutex<HashMap<String, PlanCacheEntry>>,
}

impl InMemoryPlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry with a chosen age, for freshness tests.
    pub async fn seed(&self, provider: &str, plans: JsonValue, age_hours: i64) {
        self.entries.lock().await.insert(
            provider.to_string(),
            PlanCacheEntry {
                provider: provider.to_string(),
                plans,
                last_updated: Utc::now() - chrono::Duration::hours(age_hours),
            },
        );
    }
}

#[async_trait]
impl PlanCacheStore for InMemoryPlanCache {
    async fn get(&self, provider: &str) -> Result<Option<PlanCacheEntry>, DatabaseError> {
        Ok(self.entries.lock().await.get(provider).cloned())
    }

    async fn upsert(
        &self,
        provider: &str,
        plans: &JsonValue,
    ) -> Result<PlanCacheEntry, DatabaseError> {
        let entry = PlanCacheEntry {
            provider: provider.to_string(),
            plans: plans.clone(),
            last_updated: Utc::now(),
        };
        self.entries
            .lock()
            .await
            .insert(provider.to_string(), entry.clone());
        Ok(entry)
    }
}

// ---------------------------------------------------------------------------
// Scripted vendor
// ---------------------------------------------------------------------------

pub struct MockVendor {
    sandbox: bool,
    pay_response: Mutex<Result<JsonValue, VendorError>>,
    variations_response: Mutex<Result<JsonValue, VendorError>>,
    pub pay_calls: AtomicUsize,
    pub variation_calls: AtomicUsize,
    pub requests: Mutex<Vec<VendRequest>>,
}

impl MockVendor {
    pub fn new(sandbox: bool, pay_response: JsonValue) -> Self {
        Self {
            sandbox,
            pay_response: Mutex::new(Ok(pay_response)),
            variations_response: Mutex::new(Ok(JsonValue::Null)),
            pay_calls: AtomicUsize::new(0),
            variation_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(sandbox: bool, error: VendorError) -> Self {
        let vendor = Self::new(sandbox, JsonValue::Null);
        *vendor.pay_response.try_lock().expect("fresh mutex") = Err(error);
        vendor
    }

    pub fn with_variations(self, response: JsonValue) -> Self {
        *self
            .variations_response
            .try_lock()
            .expect("fresh mutex") = Ok(response);
        self
    }

    pub fn with_variations_error(self, error: VendorError) -> Self {
        *self
            .variations_response
            .try_lock()
            .expect("fresh mutex") = Err(error);
        self
    }

    pub async fn last_request(&self) -> Option<VendRequest> {
        self.requests.lock().await.last().cloned()
    }
}

#[async_trait]
impl VendorApi for MockVendor {
    async fn pay(&self, request: &VendRequest) -> Result<JsonValue, VendorError> {
        self.pay_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request.clone());
        self.pay_response.lock().await.clone()
    }

    async fn service_variations(&self, _service_id: &str) -> Result<JsonValue, VendorError> {
        self.variation_calls.fetch_add(1, Ordering::SeqCst);
        self.variations_response.lock().await.clone()
    }

    fn is_sandbox(&self) -> bool {
        self.sandbox
    }
}

// ---------------------------------------------------------------------------
// Scripted gateway
// ---------------------------------------------------------------------------

pub const TEST_WEBHOOK_SECRET: &str = "sk_test_webhook";

pub struct MockGateway {
    init_response: Mutex<Result<CheckoutSession, PaymentError>>,
    verify_response: Mutex<Result<GatewayCharge, PaymentError>>,
    pub init_calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            init_response: Mutex::new(Ok(CheckoutSession {
                checkout_url: "https://checkout.paystack.test/abc123".to_string(),
                access_code: "abc123".to_string(),
                reference: String::new(),
            })),
            verify_response: Mutex::new(Ok(GatewayCharge {
                amount: 0,
                currency: "NGN".to_string(),
                status: "success".to_string(),
                channel: Some("card".to_string()),
                paid_at: None,
                gateway_response: None,
            })),
            init_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub async fn set_init_error(&self, error: PaymentError) {
        *self.init_response.lock().await = Err(error);
    }

    pub async fn set_verify_response(&self, charge: GatewayCharge) {
        *self.verify_response.lock().await = Ok(charge);
    }

    pub async fn set_verify_error(&self, error: PaymentError) {
        *self.verify_response.lock().await = Err(error);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initialize_checkout(
        &self,
        request: CheckoutRequest,
    ) -> PaymentResult<CheckoutSession> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let mut session = self.init_response.lock().await.clone()?;
        session.reference = request.reference;
        Ok(session)
    }

    async fn verify_charge(&self, _reference: &str) -> PaymentResult<GatewayCharge> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.verify_response.lock().await.clone()
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> bool {
        verify_hmac_sha512_hex(payload, TEST_WEBHOOK_SECRET, signature)
    }

    fn parse_charge_event(&self, payload: &[u8]) -> PaymentResult<ChargeEvent> {
        let parsed: JsonValue = serde_json::from_slice(payload).map_err(|e| {
            PaymentError::WebhookVerificationError {
                message: e.to_string(),
            }
        })?;
        let data = parsed.get("data");
        Ok(ChargeEvent {
            event_type: parsed
                .get("event")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string(),
            reference: data
                .and_then(|v| v.get("reference"))
                .and_then(|v| v.as_str())
                .map(|v| v.to_string()),
            status: data
                .and_then(|v| v.get("status"))
                .and_then(|v| v.as_str())
                .map(|v| v.to_string()),
            amount: data.and_then(|v| v.get("amount")).and_then(|v| v.as_i64()),
            payload: parsed,
        })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn airtime_transaction(tx_ref: &str) -> NewTransaction {
    NewTransaction {
        tx_ref: tx_ref.to_string(),
        user_id: "anonymous".to_string(),
        category: "airtime".to_string(),
        amount: 1000,
        details: serde_json::json!({"phone": "08012345678", "network": "MTN"}),
        provider: Some("MTN".to_string()),
        payment_method: "mock".to_string(),
    }
}

pub fn vendor_success_response() -> JsonValue {
    serde_json::json!({
        "code": "000",
        "response_description": "TRANSACTION SUCCESSFUL",
        "content": {"transactions": {"status": "delivered"}}
    })
}
