//! Local, unverified inspection of access-token claims.
//!
//! The client holds no verification key; it only peeks at `exp` to
//! decide whether a refresh is worth attempting before the request.
//! The server remains the authority.

use crate::error::ClientError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Read the `exp` claim of a JWT without verifying its signature.
///
/// # Errors
///
/// Returns `MalformedToken` if the token is not shaped like a JWT or
/// carries no numeric `exp`.
pub fn expiry_of(token: &str) -> Result<DateTime<Utc>, ClientError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ClientError::MalformedToken("not a three-part JWT".to_string()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| ClientError::MalformedToken(format!("payload not base64: {e}")))?;

    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::MalformedToken(format!("payload not JSON: {e}")))?;

    let exp = claims
        .get("exp")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| ClientError::MalformedToken("missing exp claim".to_string()))?;

    DateTime::from_timestamp(exp, 0)
        .ok_or_else(|| ClientError::MalformedToken("exp out of range".to_string()))
}

/// Cheap local check: is the token expired (or within `leeway` of it)?
/// A malformed token counts as expired; the server would reject it
/// anyway.
#[must_use]
pub fn is_locally_expired(token: &str, leeway: Duration) -> bool {
    match expiry_of(token) {
        Ok(exp) => {
            let leeway = chrono::Duration::from_std(leeway).unwrap_or_else(|_| chrono::Duration::zero());
            exp - leeway <= Utc::now()
        }
        Err(_) => true,
    }
}
