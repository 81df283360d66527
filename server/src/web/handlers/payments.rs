// PayPal order handlers

use axum::{
    extract::{Query, State},
    response::{Json, Redirect},
};
use serde::Deserialize;
use tracing::info;

use super::common::{api_error, ok, ApiError, ApiResult, TokenQuery};
use crate::errors::LuberError;
use crate::services::paypal::CreatedOrder;
use crate::web::AppState;

pub const CUSTOMER_PAGE: &str = "/customer.html";

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOrderRequest {
    pub total: Option<f64>,
    pub schedule_id: Option<String>,
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<CreatedOrder> {
    let (Some(total), Some(schedule_id)) = (
        request.total,
        request.schedule_id.filter(|id| !id.trim().is_empty()),
    ) else {
        return Err(api_error(LuberError::validation(
            "total",
            "total and scheduleId are required",
        )));
    };

    let order = state
        .schedules
        .create_order(&schedule_id, total)
        .await
        .map_err(api_error)?;
    ok(order)
}

/// PayPal return URL. The `token` parameter carries the approved order id.
pub async fn capture_order(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Redirect, ApiError> {
    let order_id = query
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| api_error(LuberError::validation("token", "is required")))?;

    let schedule_id = state
        .schedules
        .capture_order(&order_id)
        .await
        .map_err(api_error)?;

    info!("Order {} captured for schedule {}", order_id, schedule_id);
    Ok(Redirect::to(CUSTOMER_PAGE))
}
