use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use subtle::ConstantTimeEq;

/// Header carrying the end user's id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Alternative to `Authorization: Bearer`
pub const API_KEY_HEADER: &str = "x-api-key";

/// Used when the caller does not say who the user is
pub const ANONYMOUS_USER: &str = "anonymous";

/// Rejects requests without the configured API key. Open when no key is configured.
///
/// The key is looked up per request so a config reload takes effect immediately.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config_manager.config().api_key() else {
        return Ok(next.run(req).await);
    };

    match presented_key(req.headers()) {
        Some(key) if bool::from(key.as_bytes().ct_eq(expected.as_bytes())) => {
            Ok(next.run(req).await)
        }
        _ => {
            tracing::debug!(path = %req.uri().path(), "Rejected request without valid API key");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    bearer.or_else(|| headers.get(API_KEY_HEADER).and_then(|h| h.to_str().ok()))
}

/// Extractor for the `x-user-id` header, defaulting to `anonymous`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(ANONYMOUS_USER);
        Ok(UserId(user.to_string()))
    }
}
