// Account, session and vehicle handlers

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::Session;
use tracing::info;

use super::common::{api_error, ok, ApiResult};
use crate::database::{AccountType, CustomerRecord, VehicleRecord};
use crate::services::account_service::{CustomerProfile, NewVehicle, RegisterRequest};
use crate::web::middleware::ClientIp;
use crate::web::session::CustomerSession;
use crate::web::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: String,
    pub account_type: AccountType,
    pub full_name: String,
}

impl From<&CustomerRecord> for SessionInfo {
    fn from(customer: &CustomerRecord) -> Self {
        Self {
            user_id: customer.id.clone(),
            account_type: customer.account_type,
            full_name: customer.full_name.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MilageRequest {
    pub milage: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MilageUpdated {
    pub milage: i64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CancellationArchiveRequest {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CancellationArchived {
    pub archived: bool,
}

// Numbers may arrive as JSON numbers or numeric strings from form posts
fn number_value(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<SessionInfo> {
    let customer = state.accounts.register(request).await.map_err(api_error)?;

    CustomerSession::new(&session)
        .login(&customer)
        .await
        .map_err(api_error)?;

    ok(SessionInfo::from(&customer))
}

pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> ApiResult<SessionInfo> {
    let customer = state
        .accounts
        .login(&request.email, &request.password, &ip)
        .await
        .map_err(api_error)?;

    CustomerSession::new(&session)
        .login(&customer)
        .await
        .map_err(api_error)?;

    ok(SessionInfo::from(&customer))
}

pub async fn logout(session: Session) -> ApiResult<()> {
    CustomerSession::new(&session)
        .logout()
        .await
        .map_err(api_error)?;
    info!("Session closed");
    ok(())
}

pub async fn customer_profile(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<CustomerProfile> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    let profile = state
        .accounts
        .profile(&customer_id)
        .await
        .map_err(api_error)?;
    ok(profile)
}

pub async fn list_vehicles(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Vec<VehicleRecord>> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    let vehicles = state
        .accounts
        .vehicles(&customer_id)
        .await
        .map_err(api_error)?;
    ok(vehicles)
}

pub async fn add_vehicle(
    State(state): State<AppState>,
    session: Session,
    Json(vehicle): Json<NewVehicle>,
) -> ApiResult<VehicleRecord> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    let vehicle = state
        .accounts
        .add_vehicle(&customer_id, vehicle)
        .await
        .map_err(api_error)?;
    ok(vehicle)
}

pub async fn update_vehicle_milage(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
    session: Session,
    Json(request): Json<MilageRequest>,
) -> ApiResult<MilageUpdated> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    let milage = state
        .accounts
        .update_milage(
            &customer_id,
            &vehicle_id,
            number_value(request.milage.as_ref()),
        )
        .await
        .map_err(api_error)?;
    ok(MilageUpdated { milage })
}

pub async fn toggle_cancellation_archive(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CancellationArchiveRequest>,
) -> ApiResult<CancellationArchived> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    let archived = state
        .accounts
        .toggle_cancellation_archive(&customer_id, request.date.as_deref())
        .await
        .map_err(api_error)?;
    ok(CancellationArchived { archived })
}
