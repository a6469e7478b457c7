//! API Middleware
//!
//! Header-based identity extraction and request logging. Grounded on
//! `lactam6-financeATP/src/api/middleware.rs`'s auth/logging middleware
//! shape, replacing API-key lookup with the trusted `X-User-Id` header
//! this service's auth model assumes (spec.md §1, §6).

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::RequestContext;

/// Header names accepted for the asserted caller identity, tolerated in the
/// same case variants as `_get_header_user_id`
/// (`original_source/activity/views.py`).
const USER_ID_HEADER_NAMES: &[&str] = &["x-user-id", "user_id"];

fn extract_user_id(headers: &HeaderMap) -> Option<i64> {
    for name in USER_ID_HEADER_NAMES {
        if let Some(raw) = headers.get(*name).and_then(|v| v.to_str().ok()) {
            if let Ok(value) = raw.trim().parse::<i64>() {
                if value > 0 {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Reject requests without a valid `X-User-Id` and attach a `RequestContext`
/// to request extensions for downstream handlers.
pub async fn identity_middleware(
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let Some(asserted_user_id) = extract_user_id(&headers) else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "missing or invalid X-User-Id header",
                "error_code": "unauthenticated"
            })),
        )
            .into_response());
    };

    request
        .extensions_mut()
        .insert(RequestContext::new(asserted_user_id));

    Ok(next.run(request).await)
}

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    let correlation_id = request
        .extensions()
        .get::<RequestContext>()
        .and_then(|ctx| ctx.correlation_id);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        correlation_id = ?correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
            value.parse().unwrap(),
        );
        headers
    }

    #[test]
    fn accepts_x_user_id_case_variants() {
        assert_eq!(extract_user_id(&headers_with("X-User-Id", "42")), Some(42));
        assert_eq!(extract_user_id(&headers_with("X-User-ID", "42")), Some(42));
        assert_eq!(extract_user_id(&headers_with("X-USER-ID", "42")), Some(42));
        assert_eq!(extract_user_id(&headers_with("user_id", "42")), Some(42));
    }

    #[test]
    fn rejects_non_positive_and_non_numeric() {
        assert_eq!(extract_user_id(&headers_with("X-User-Id", "0")), None);
        assert_eq!(extract_user_id(&headers_with("X-User-Id", "-1")), None);
        assert_eq!(extract_user_id(&headers_with("X-User-Id", "abc")), None);
    }

    #[test]
    fn rejects_missing_header() {
        assert_eq!(extract_user_id(&HeaderMap::new()), None);
    }

    #[test]
    fn masks_sensitive_headers_only() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("authorization", "Bearer secret".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);
        let auth = masked.iter().find(|(k, _)| k == "authorization").unwrap();
        let ct = masked.iter().find(|(k, _)| k == "content-type").unwrap();

        assert_eq!(auth.1, "[REDACTED]");
        assert_eq!(ct.1, "application/json");
    }
}
