//! Bearer-secret check shared by the trigger and edit endpoints.

use axum::{
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::app::AppState;

/// Verify a static bearer token in the `Authorization: Bearer <token>` header.
pub fn verify_bearer_token(headers: &HeaderMap, expected: &str) -> Result<(), String> {
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing Authorization header".to_string())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| "Authorization header must use Bearer scheme".to_string())?;

    if token == expected {
        Ok(())
    } else {
        Err("bearer token mismatch".to_string())
    }
}

/// Reject the request with 401 when a secret is configured and the header
/// does not carry it. Open when no secret is configured.
pub fn require_secret(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<Value>)> {
    let Some(secret) = state.config.reconcile.secret() else {
        return Ok(());
    };
    verify_bearer_token(headers, secret).map_err(|reason| {
        warn!(reason = %reason, "request rejected");
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Unauthorized"})),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("authorization", HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_token_accepts_exact_match() {
        assert!(verify_bearer_token(&headers("Bearer s3cret"), "s3cret").is_ok());
    }

    #[test]
    fn bearer_token_rejects_wrong_or_missing() {
        assert!(verify_bearer_token(&headers("Bearer nope"), "s3cret").is_err());
        assert!(verify_bearer_token(&headers("s3cret"), "s3cret").is_err());
        assert!(verify_bearer_token(&headers("Basic s3cret"), "s3cret").is_err());
        assert!(verify_bearer_token(&HeaderMap::new(), "s3cret").is_err());
    }
}
