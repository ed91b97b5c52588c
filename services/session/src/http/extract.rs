//! Credential carriers and the access-token gate.
//!
//! Browsers carry tokens in http-only cookies plus a readable
//! anti-forgery token; everything else uses a bearer header.

use crate::http::AppState;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Http-only access token cookie.
pub const ACCESS_COOKIE: &str = "__session_access";
/// Http-only refresh token cookie.
pub const REFRESH_COOKIE: &str = "__session_refresh";
/// Readable anti-forgery cookie, echoed back in [`CSRF_HEADER`].
pub const CSRF_COOKIE: &str = "csrf_token";
/// Header carrying the anti-forgery token on cookie-borne requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Generic unauthorized response. Deliberately identical for every
/// failure variant so the wire leaks no verification oracle.
#[must_use]
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "unauthorized" })),
    )
        .into_response()
}

/// Generic internal failure response.
#[must_use]
pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal" })),
    )
        .into_response()
}

/// Extract a bearer token from the Authorization header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Extract a named cookie value.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

/// Double-submit check for cookie-borne requests: the readable CSRF
/// cookie must be echoed in the request header.
#[must_use]
pub fn csrf_matches(headers: &HeaderMap) -> bool {
    match (
        cookie_value(headers, CSRF_COOKIE),
        headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()),
    ) {
        (Some(cookie), Some(header)) => cookie == header,
        _ => false,
    }
}

/// Gate for protected endpoints: verifies the access token's signature
/// and expiry only. Never consults the revocation store; access tokens
/// stay valid until expiry.
///
/// A cookie-borne access token is attached by the browser on any
/// cross-site POST, so that carrier additionally requires the
/// anti-forgery echo before the request counts as authenticated.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(req.headers()) {
        Some(token) => token,
        None => {
            let Some(token) = cookie_value(req.headers(), ACCESS_COOKIE) else {
                return unauthorized();
            };
            if !csrf_matches(req.headers()) {
                return unauthorized();
            }
            token
        }
    };

    match state.keys.verify(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => unauthorized(),
    }
}

/// Build a Set-Cookie value for a session cookie.
#[must_use]
pub fn session_cookie(name: &str, value: &str, max_age_secs: u64, http_only: bool) -> String {
    let http_only = if http_only { "; HttpOnly" } else { "" };
    format!(
        "{name}={value}; Path=/; Max-Age={max_age_secs}; SameSite=Lax; Secure{http_only}"
    )
}

/// Build a Set-Cookie value that clears a cookie.
#[must_use]
pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; SameSite=Lax; Secure")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("csrf_token=x; __session_refresh=secret-1"),
        );
        assert_eq!(
            cookie_value(&headers, REFRESH_COOKIE).as_deref(),
            Some("secret-1")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_csrf_double_submit() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("csrf_token=tok-1"));
        headers.insert(CSRF_HEADER, HeaderValue::from_static("tok-1"));
        assert!(csrf_matches(&headers));

        headers.insert(CSRF_HEADER, HeaderValue::from_static("tok-2"));
        assert!(!csrf_matches(&headers));
    }

    #[test]
    fn test_cookie_attributes() {
        let c = session_cookie(REFRESH_COOKIE, "v", 60, true);
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("Max-Age=60"));

        let readable = session_cookie(CSRF_COOKIE, "v", 60, false);
        assert!(!readable.contains("HttpOnly"));
    }
}
