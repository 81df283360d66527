// Read-only status API of the workers process

use anyhow::Result;
use axum::{extract::State, routing::get, Router};
use server::database::{CustomerRecord, WelcomeNotificationRecord};
use server::web::handlers::common::{api_error, ok, ApiResult};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::context::WorkerContext;
use crate::history::MovedSchedule;
use crate::registry::{JobRegistry, JobStatus};

#[derive(Clone)]
pub struct StatusState {
    pub context: WorkerContext,
    pub registry: JobRegistry,
}

pub fn create_status_router(state: StatusState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/api/moved-schedules", get(moved_schedules))
        .route("/api/notifications", get(welcome_notifications))
        .route("/api/customers", get(customers))
        .route("/api/workers", get(workers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_status_server(state: StatusState) -> Result<()> {
    let addr = format!(
        "{}:{}",
        state.context.config.host, state.context.config.workers.port
    );
    let app = create_status_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Worker status server running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn liveness() -> &'static str {
    "Luber workers running"
}

async fn moved_schedules(State(state): State<StatusState>) -> ApiResult<Vec<MovedSchedule>> {
    ok(state.context.history.entries().await)
}

async fn welcome_notifications(
    State(state): State<StatusState>,
) -> ApiResult<Vec<WelcomeNotificationRecord>> {
    let notifications = state
        .context
        .database
        .list_welcome_notifications()
        .await
        .map_err(|e| api_error(e.into()))?;
    ok(notifications)
}

async fn customers(State(state): State<StatusState>) -> ApiResult<Vec<CustomerRecord>> {
    let customers = state
        .context
        .database
        .list_customers()
        .await
        .map_err(|e| api_error(e.into()))?;
    ok(customers)
}

async fn workers(State(state): State<StatusState>) -> ApiResult<Vec<JobStatus>> {
    ok(state.registry.snapshot().await)
}
