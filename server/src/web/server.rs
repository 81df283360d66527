use crate::config::Config;
use crate::constants::defaults;
use crate::database::Database;
use crate::web::{handlers, AppState};
use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

pub async fn start_web_server(state: AppState) -> Result<()> {
    let sessions = session_layer(&state.database, &state.config).await?;
    let app = create_router(state.clone(), sessions)?;

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Session layer backed by the shared SQLite database
pub async fn session_layer(
    database: &Database,
    config: &Config,
) -> Result<SessionManagerLayer<SqliteStore>> {
    let store = SqliteStore::new(database.pool().clone());
    store.migrate().await?;

    Ok(SessionManagerLayer::new(store)
        .with_secure(config.public_base_url.starts_with("https://"))
        .with_expiry(Expiry::OnInactivity(time::Duration::days(
            defaults::SESSION_INACTIVITY_DAYS,
        ))))
}

fn cors_layer(config: &Config) -> Result<CorsLayer> {
    if config.cors_origin == "*" {
        return Ok(CorsLayer::permissive());
    }

    // Credentialed requests need an explicit origin
    Ok(CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<HeaderValue>()?)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

pub fn create_router(
    state: AppState,
    sessions: SessionManagerLayer<SqliteStore>,
) -> Result<Router> {
    let cors = cors_layer(&state.config)?;

    Ok(Router::new()
        // === ACCOUNT ROUTES ===
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/customer-profile", get(handlers::customer_profile))
        .route(
            "/api/vehicles",
            get(handlers::list_vehicles).post(handlers::add_vehicle),
        )
        .route(
            "/api/vehicles/{vehicle_id}/milage",
            put(handlers::update_vehicle_milage),
        )
        .route(
            "/api/customer-cancellation-archive",
            put(handlers::toggle_cancellation_archive),
        )
        // === CATALOGUE & SCHEDULING ROUTES ===
        .route("/api/services", get(handlers::list_services))
        .route("/api/availability", get(handlers::get_availability))
        .route(
            "/api/schedule",
            get(handlers::list_schedules).post(handlers::create_schedule),
        )
        .route("/api/schedule/{id}", delete(handlers::cancel_schedule))
        .route("/api/fleet-schedules", get(handlers::list_fleet_schedules))
        // === OFFICE LIFECYCLE ROUTES ===
        .route(
            "/api/office/schedules/{id}/confirm",
            post(handlers::confirm_schedule),
        )
        .route(
            "/api/office/schedules/{id}/process",
            post(handlers::process_schedule),
        )
        .route(
            "/api/office/schedules/{id}/invoice",
            post(handlers::attach_invoice),
        )
        .route(
            "/api/office/schedules/{id}/complete",
            post(handlers::complete_schedule),
        )
        // === PAYPAL ROUTES ===
        .route("/api/paypal/create-order", post(handlers::create_order))
        .route("/api/paypal/capture-order", get(handlers::capture_order))
        // === CHAT ROUTES ===
        .route("/api/chat/send", post(handlers::send_message))
        .route("/api/chat/history", get(handlers::chat_history))
        .route("/api/chat/all", get(handlers::list_conversations))
        .route("/api/chat/reply", post(handlers::office_reply))
        .route("/api/chat/archive", post(handlers::archive_conversation))
        .route(
            "/api/bot/replies",
            get(handlers::list_bot_replies).post(handlers::save_bot_reply),
        )
        // === REALTIME ROUTES ===
        .route("/ws", get(handlers::websocket))
        .route(
            "/api/realtime/conversations/{customer_id}",
            post(handlers::relay_conversation),
        )
        // Add middleware
        .layer(sessions)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
