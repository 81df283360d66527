//! Router harness: drives the full axum app with `oneshot` requests

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use server::config::Config;
use server::database::Database;
use server::web::{create_router, session_layer, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

use super::test_data::OFFICE_KEY;

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// `name=value` part of the session cookie, when one was set
    pub cookie: Option<String>,
    pub location: Option<String>,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn message(&self) -> Option<&str> {
        self.body["message"].as_str()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new(config: Arc<Config>) -> Result<Self> {
        let database = Arc::new(Database::in_memory().await?);
        let state = AppState::build(config, database)?;
        let sessions = session_layer(&state.database, &state.config).await?;
        let router = create_router(state.clone(), sessions)?;
        Ok(Self { router, state })
    }

    pub fn database(&self) -> Arc<Database> {
        self.state.database.clone()
    }

    /// Serves the router on an ephemeral local port, for WebSocket clients
    pub async fn serve(&self) -> Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = self
            .router
            .clone()
            .into_make_service_with_connect_info::<SocketAddr>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(addr)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
        office_key: Option<&str>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.7");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(key) = office_key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        Ok(TestResponse {
            status,
            body,
            cookie,
            location,
        })
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Result<TestResponse> {
        self.send(Method::GET, uri, None, cookie, None).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> Result<TestResponse> {
        self.send(Method::POST, uri, Some(body), cookie, None).await
    }

    pub async fn office_get(&self, uri: &str) -> Result<TestResponse> {
        self.send(Method::GET, uri, None, None, Some(OFFICE_KEY)).await
    }

    pub async fn office_post(&self, uri: &str, body: Value) -> Result<TestResponse> {
        self.send(Method::POST, uri, Some(body), None, Some(OFFICE_KEY))
            .await
    }

    /// Registers a customer through the API and returns its session cookie
    pub async fn register(&self, body: Value) -> Result<(TestResponse, String)> {
        let response = self.post("/api/register", body, None).await?;
        let cookie = response.cookie.clone().unwrap_or_default();
        Ok((response, cookie))
    }
}
