//! Plumbing shared by the admin gateway and the fleet manager: the JSON
//! error body and the standard middleware stack.

use crate::error::LikeError;
use anyhow::{Context, Result};
use axum::Router;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB)
pub const MAX_BODY_SIZE: usize = 65_536;
/// A like batch sleeps between targets, so this is generous
pub const REQUEST_TIMEOUT_SECS: u64 = 600;

/// Error response: `{"error": "...", "kind": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            kind: "unauthorized",
            message: "missing or invalid token".into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: "not found".into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<LikeError> for ApiError {
    fn from(error: LikeError) -> Self {
        let status = match &error {
            LikeError::UnknownInstance { .. } => StatusCode::NOT_FOUND,
            LikeError::UpstreamUnreachable { .. } | LikeError::UpstreamRejected { .. } => {
                StatusCode::BAD_GATEWAY
            }
            LikeError::InvalidArgument { .. }
            | LikeError::Busy
            | LikeError::Persistence { .. }
            | LikeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}

pub async fn fallback_not_found() -> ApiError {
    ApiError::not_found()
}

pub(crate) fn parse_bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let host = host.trim().trim_start_matches('[').trim_end_matches(']');
    let host = if host.is_empty() || host == "localhost" {
        "127.0.0.1"
    } else {
        host
    };
    let ip: std::net::IpAddr = host
        .parse()
        .with_context(|| format!("invalid bind host {host:?}"))?;
    Ok(SocketAddr::new(ip, port))
}

/// Body limit, request timeout and optional CORS.
pub(crate) fn with_common_layers(app: Router, cors_origins: &[String]) -> Router {
    let mut app = app
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ));

    if !cors_origins.is_empty() {
        let origins: Vec<_> = cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::HeaderName::from_static("x-admin-token"),
                ]),
        );
    }

    app
}
