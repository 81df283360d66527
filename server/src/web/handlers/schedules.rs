// Catalogue, availability and appointment handlers

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use tower_sessions::Session;

use super::common::{api_error, ok, ApiResult, DateQuery, UserIdQuery};
use crate::database::{ScheduleRecord, ServiceRecord};
use crate::errors::LuberError;
use crate::services::schedule_service::{CreateScheduleRequest, CreatedSchedule};
use crate::web::middleware::OfficeKey;
use crate::web::session::CustomerSession;
use crate::web::AppState;

pub async fn list_services(State(state): State<AppState>) -> ApiResult<Vec<ServiceRecord>> {
    let services = state
        .database
        .list_services()
        .await
        .map_err(|e| api_error(e.into()))?;
    ok(services)
}

pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
    session: Session,
) -> ApiResult<Vec<String>> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    let date = query
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| api_error(LuberError::validation("date", "is required")))?;

    let slots = state
        .schedules
        .availability(&customer_id, &date)
        .await
        .map_err(api_error)?;
    ok(slots)
}

pub async fn create_schedule(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateScheduleRequest>,
) -> ApiResult<CreatedSchedule> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    let created = state
        .schedules
        .create(&customer_id, request)
        .await
        .map_err(api_error)?;
    ok(created)
}

pub async fn list_schedules(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
    session: Session,
) -> ApiResult<Vec<ScheduleRecord>> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    // Without a user id the session's own schedules are listed
    let requested = query.user_id.unwrap_or_else(|| customer_id.clone());

    let schedules = state
        .schedules
        .list_for_customer(&customer_id, &requested)
        .await
        .map_err(api_error)?;
    ok(schedules)
}

pub async fn cancel_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
    session: Session,
) -> ApiResult<()> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    state
        .schedules
        .cancel(&customer_id, &schedule_id)
        .await
        .map_err(api_error)?;
    ok(())
}

pub async fn list_fleet_schedules(
    _office: OfficeKey,
    State(state): State<AppState>,
) -> ApiResult<Vec<ScheduleRecord>> {
    let schedules = state.schedules.fleet_schedules().await.map_err(api_error)?;
    ok(schedules)
}
