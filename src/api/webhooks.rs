use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::warn;

use crate::services::webhook::{WebhookError, WebhookService};

pub struct WebhookState {
    pub service: Arc<WebhookService>,
}

/// POST /webhooks/paystack
///
/// Signature failures are the only non-200 responses; the gateway retries
/// anything else indefinitely.
pub async fn handle_paystack_webhook(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get("x-paystack-signature")
        .and_then(|v| v.to_str().ok());

    match state.service.process(signature, &body).await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(WebhookError::MissingSignature) => {
            warn!("webhook rejected: no signature header");
            (StatusCode::UNAUTHORIZED, "No signature.").into_response()
        }
        Err(WebhookError::InvalidSignature) => {
            (StatusCode::UNAUTHORIZED, "Invalid signature").into_response()
        }
    }
}
