// =============================================================================
// Bearer Token Authentication - Axum extractor
// =============================================================================
//
// Mutating endpoints (settings, candle backfill, price sync) and the
// WebSocket feed require the admin token from `CONFLUENCE_ADMIN_TOKEN`.
// Read-only endpoints are public.
//
//   async fn handler(_auth: AuthBearer, ...) { ... }
//
// A missing or wrong token short-circuits with 403 before the handler runs.
// An unset token rejects every authenticated request.
// =============================================================================

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

/// Environment variable holding the admin token.
pub const ADMIN_TOKEN_ENV: &str = "CONFLUENCE_ADMIN_TOKEN";

/// Compare two byte slices without an early exit on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Token configured for this process, read per request so it can be
/// rotated without a restart.
fn expected_token() -> Option<String> {
    std::env::var(ADMIN_TOKEN_ENV)
        .ok()
        .filter(|token| !token.is_empty())
}

/// Validate a presented token (also used for the WebSocket `?token=` query).
pub fn validate_token(token: &str) -> bool {
    expected_token().is_some_and(|expected| constant_time_eq(token.as_bytes(), expected.as_bytes()))
}

/// Proof that the request carried a valid `Authorization: Bearer` header.
pub struct AuthBearer;

pub struct AuthRejection(&'static str);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::FORBIDDEN, Json(serde_json::json!({ "error": self.0 }))).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthBearer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if expected_token().is_none() {
            warn!("{ADMIN_TOKEN_ENV} is not set; rejecting authenticated request");
            return Err(AuthRejection("Server authentication not configured"));
        }

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                warn!("missing or malformed Authorization header");
                AuthRejection("Missing or invalid authorization token")
            })?;

        if !validate_token(token) {
            warn!(path = %parts.uri.path(), "invalid admin token presented");
            return Err(AuthRejection("Invalid authorization token"));
        }

        Ok(AuthBearer)
    }
}
