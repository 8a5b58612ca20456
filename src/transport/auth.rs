use super::http::ApiError;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Static shared secret guarding an HTTP surface. Without a configured
/// token every request passes.
#[derive(Debug, Clone, Default)]
pub struct SharedSecret(Option<Arc<str>>);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn query_token(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

impl SharedSecret {
    pub fn new(token: Option<&str>) -> Self {
        Self(
            token
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(Arc::from),
        )
    }

    pub fn is_open(&self) -> bool {
        self.0.is_none()
    }

    /// Accepts `Authorization: Bearer`, `X-Admin-Token` or `?token=`.
    pub fn authorize(&self, headers: &HeaderMap, query: Option<&str>) -> bool {
        let Some(expected) = &self.0 else {
            return true;
        };
        let presented = bearer_token(headers)
            .or_else(|| header_token(headers))
            .map(ToOwned::to_owned)
            .or_else(|| query_token(query));
        presented.is_some_and(|token| constant_time_eq(&token, expected))
    }
}

/// Route layer rejecting unauthenticated requests with 401.
pub async fn require_secret(
    State(secret): State<SharedSecret>,
    request: Request,
    next: Next,
) -> Response {
    if secret.authorize(request.headers(), request.uri().query()) {
        return next.run(request).await;
    }
    tracing::warn!(path = %request.uri().path(), "rejected request with missing or invalid token");
    ApiError::unauthorized().into_response()
}
