// =============================================================================
// Bearer Token Authentication — Axum Extractor
// =============================================================================
//
// Validates the `Authorization: Bearer <token>` header against the
// `BOREALIS_ADMIN_TOKEN` environment variable. The public plan-computation
// endpoints need no token; the admin endpoints (history, state, config) do.
//
// Usage:
//
//   async fn handler(_auth: AuthBearer, ...) { ... }
//
// If the token is missing or invalid, the extractor short-circuits the request
// with a 403 Forbidden response before the handler body executes. Token
// comparison runs in constant time.
// =============================================================================

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

/// Compare two byte slices in constant time, examining every byte even after
/// a mismatch is found. A length mismatch returns early; the attacker does
/// not control the expected token length, so that leak is acceptable here.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Axum extractor yielding the validated admin token string.
pub struct AuthBearer(pub String);

/// Rejection returned when authentication fails.
pub struct AuthRejection {
    status: StatusCode,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, axum::Json(body)).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthBearer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Read the expected token per request so that rotation does not
        // require a restart.
        let expected = std::env::var("BOREALIS_ADMIN_TOKEN").unwrap_or_default();
        if expected.is_empty() {
            warn!("BOREALIS_ADMIN_TOKEN is not set — all admin requests will be rejected");
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Server authentication not configured",
            });
        }

        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let token = match token {
            Some(t) => t,
            None => {
                warn!("Missing or malformed Authorization header");
                return Err(AuthRejection {
                    status: StatusCode::FORBIDDEN,
                    message: "Missing or invalid authorization token",
                });
            }
        };

        if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            warn!("Invalid admin token presented");
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                message: "Invalid authorization token",
            });
        }

        Ok(AuthBearer(token.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_tokens_match() {
        assert!(constant_time_eq(b"planner-admin", b"planner-admin"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn different_tokens_do_not_match() {
        assert!(!constant_time_eq(b"planner-admin", b"planner-guest"));
        assert!(!constant_time_eq(b"\x00", b"\x01"));
    }

    #[test]
    fn different_lengths_do_not_match() {
        assert!(!constant_time_eq(b"short", b"much-longer-token"));
    }
}
