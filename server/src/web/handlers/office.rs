// Back-office lifecycle actions on schedules

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;

use super::common::{api_error, ok, ApiResult};
use crate::database::ScheduleRecord;
use crate::services::schedule_service::CompleteRequest;
use crate::web::middleware::OfficeKey;
use crate::web::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceRequest {
    pub invoice_id: String,
}

pub async fn confirm_schedule(
    _office: OfficeKey,
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
) -> ApiResult<ScheduleRecord> {
    let schedule = state
        .schedules
        .confirm(&schedule_id)
        .await
        .map_err(api_error)?;
    ok(schedule)
}

pub async fn process_schedule(
    _office: OfficeKey,
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
) -> ApiResult<ScheduleRecord> {
    let schedule = state
        .schedules
        .process(&schedule_id)
        .await
        .map_err(api_error)?;
    ok(schedule)
}

pub async fn attach_invoice(
    _office: OfficeKey,
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
    Json(request): Json<InvoiceRequest>,
) -> ApiResult<ScheduleRecord> {
    let schedule = state
        .schedules
        .attach_invoice(&schedule_id, &request.invoice_id)
        .await
        .map_err(api_error)?;
    ok(schedule)
}

pub async fn complete_schedule(
    _office: OfficeKey,
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
    Json(request): Json<CompleteRequest>,
) -> ApiResult<ScheduleRecord> {
    let schedule = state
        .schedules
        .complete(&schedule_id, request)
        .await
        .map_err(api_error)?;
    ok(schedule)
}
