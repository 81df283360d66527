//! Request extractors shared by the handlers.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use std::net::SocketAddr;

use crate::web::AppState;

/// Validates the office API key. Accepted as `Authorization: Bearer <key>`,
/// an `x-api-key` header, or a `key` query parameter (browser WebSockets
/// cannot set headers).
pub struct OfficeKey;

fn query_key(parts: &Parts) -> Option<&str> {
    parts
        .uri
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("key="))
}

impl FromRequestParts<AppState> for OfficeKey {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.config.office_api_key.as_str();
        if expected.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let bearer = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "));
        let header = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok());

        match bearer.or(header).or_else(|| query_key(parts)) {
            Some(token) if token == expected => Ok(OfficeKey),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}

/// Client address: first `x-forwarded-for` entry, else the peer address
pub struct ClientIp(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let ip = forwarded.unwrap_or_else(|| {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
                .unwrap_or_default()
        });

        Ok(ClientIp(ip))
    }
}
