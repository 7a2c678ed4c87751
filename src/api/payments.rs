use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::error::{app_error_response, get_request_id_from_headers, ErrorResponse};
use crate::services::payments::{
    InitPaymentInput, InitPaymentResponse, MockConfirmResponse, PaymentService,
    VerifyPaymentResponse,
};

pub struct PaymentsState {
    pub service: Arc<PaymentService>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize)]
pub struct TxRefRequest {
    #[serde(rename = "txRef")]
    pub tx_ref: Option<String>,
}

/// POST /api/payments/initialize
pub async fn initialize_payment(
    State(state): State<Arc<PaymentsState>>,
    headers: HeaderMap,
    Json(payload): Json<InitPaymentInput>,
) -> Result<Json<InitPaymentResponse>, ApiError> {
    let request_id = get_request_id_from_headers(&headers);
    state
        .service
        .init_payment(payload)
        .await
        .map(Json)
        .map_err(|e| app_error_response(e, request_id))
}

/// POST /api/payments/verify
pub async fn verify_payment(
    State(state): State<Arc<PaymentsState>>,
    headers: HeaderMap,
    Json(payload): Json<TxRefRequest>,
) -> Result<Json<VerifyPaymentResponse>, ApiError> {
    let request_id = get_request_id_from_headers(&headers);
    state
        .service
        .verify_payment(payload.tx_ref.as_deref().unwrap_or_default())
        .await
        .map(Json)
        .map_err(|e| app_error_response(e, request_id))
}

/// POST /api/payments/mock-confirm
///
/// Only mounted when ENABLE_MOCK_PAYMENTS=true.
pub async fn confirm_mock_payment(
    State(state): State<Arc<PaymentsState>>,
    headers: HeaderMap,
    Json(payload): Json<TxRefRequest>,
) -> Result<Json<MockConfirmResponse>, ApiError> {
    let request_id = get_request_id_from_headers(&headers);
    state
        .service
        .confirm_mock_payment(payload.tx_ref.as_deref().unwrap_or_default())
        .await
        .map(Json)
        .map_err(|e| app_error_response(e, request_id))
}
