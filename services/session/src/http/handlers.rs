//! Route handlers for the session endpoints.

use crate::http::extract::{
    cookie_value, csrf_matches, expired_cookie, internal_error, session_cookie, unauthorized,
    ACCESS_COOKIE, CSRF_COOKIE, REFRESH_COOKIE,
};
use crate::http::AppState;
use crate::jwt::AccessClaims;
use crate::refresh::generator::generate_secret;
use crate::refresh::TokenPair;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

/// Optional JSON body for refresh and logout.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// How the refresh secret reached us; cookie callers get cookies back.
enum Carrier {
    Bearer(String),
    Cookie(String),
}

fn presented_refresh(headers: &HeaderMap, body: Option<&RefreshRequest>) -> Option<Carrier> {
    if let Some(token) = body.and_then(|b| b.refresh_token.clone()) {
        return Some(Carrier::Bearer(token));
    }
    let token = cookie_value(headers, REFRESH_COOKIE)?;
    // Cookie-borne state changes need the anti-forgery echo.
    csrf_matches(headers).then_some(Carrier::Cookie(token))
}

/// `POST /auth/refresh`
///
/// Every rotation failure maps to the same generic 401; the reuse
/// branch is already logged server-side by the rotation engine.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Response {
    let body = body.map(|Json(b)| b);
    let Some(carrier) = presented_refresh(&headers, body.as_ref()) else {
        return unauthorized();
    };

    let (secret, via_cookie) = match &carrier {
        Carrier::Bearer(s) => (s.as_str(), false),
        Carrier::Cookie(s) => (s.as_str(), true),
    };

    match state.rotator.rotate(secret).await {
        Ok(pair) => token_pair_response(&pair, via_cookie, state.access_ttl_secs, state.refresh_ttl_secs),
        Err(e) if e.is_unauthorized() => unauthorized(),
        Err(e) => {
            error!(error = %e, "refresh failed");
            internal_error()
        }
    }
}

/// `POST /auth/logout`
///
/// With a presented refresh token: revokes that token's entire family
/// (the family is the unit of trust). Without one: revokes every
/// session of the authenticated user.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Response {
    let body = body.map(|Json(b)| b);
    let result = match presented_refresh(&headers, body.as_ref()) {
        Some(Carrier::Bearer(secret) | Carrier::Cookie(secret)) => {
            state.rotator.revoke_presented(&secret).await
        }
        None => state
            .rotator
            .revoke_all_for_user(&claims.sub)
            .await
            .map(|_| ()),
    };

    match result {
        Ok(()) => {
            let mut res = StatusCode::NO_CONTENT.into_response();
            for cookie in [
                expired_cookie(ACCESS_COOKIE),
                expired_cookie(REFRESH_COOKIE),
                expired_cookie(CSRF_COOKIE),
            ] {
                append_cookie(&mut res, &cookie);
            }
            res
        }
        Err(e) => {
            error!(error = %e, "logout failed");
            internal_error()
        }
    }
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn token_pair_response(
    pair: &TokenPair,
    via_cookie: bool,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
) -> Response {
    let mut res = (StatusCode::OK, Json(pair)).into_response();

    if via_cookie {
        let csrf = generate_secret();
        for cookie in [
            session_cookie(ACCESS_COOKIE, &pair.access_token, access_ttl_secs, true),
            session_cookie(REFRESH_COOKIE, &pair.refresh_token, refresh_ttl_secs, true),
            session_cookie(CSRF_COOKIE, &csrf, refresh_ttl_secs, false),
        ] {
            append_cookie(&mut res, &cookie);
        }
    }

    res
}

fn append_cookie(res: &mut Response, cookie: &str) {
    if let Ok(value) = HeaderValue::from_str(cookie) {
        res.headers_mut().append(SET_COOKIE, value);
    }
}
