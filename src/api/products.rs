use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::error::{app_error_response, get_request_id_from_headers, ErrorResponse};
use crate::services::plans::{DataPlansResponse, HotDealsResponse, PlanService};

pub struct ProductsState {
    pub service: Arc<PlanService>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize)]
pub struct DataPlansRequest {
    pub provider: Option<String>,
}

/// POST /api/products/data-plans
pub async fn data_plans(
    State(state): State<Arc<ProductsState>>,
    headers: HeaderMap,
    Json(payload): Json<DataPlansRequest>,
) -> Result<Json<DataPlansResponse>, ApiError> {
    let request_id = get_request_id_from_headers(&headers);
    state
        .service
        .get_data_plans(payload.provider.as_deref().unwrap_or_default())
        .await
        .map(Json)
        .map_err(|e| app_error_response(e, request_id))
}

/// GET /api/products/hot-deals
pub async fn hot_deals(State(state): State<Arc<ProductsState>>) -> Json<HotDealsResponse> {
    Json(state.service.hot_deals())
}
