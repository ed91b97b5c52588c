use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Access-token claim set.
///
/// Self-contained and unrevokable before expiry by design; consumers
/// verify the signature and expiry only and never consult the
/// revocation store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Issuer
    pub iss: String,
    /// Subject: the user id
    pub sub: String,
    /// Verified email of the subject
    pub email: String,
    /// Expiry, seconds since epoch
    pub exp: i64,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Token id
    pub jti: String,
}

impl AccessClaims {
    #[must_use]
    pub fn new(issuer: &str, user_id: &str, email: &str, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();
        AccessClaims {
            iss: issuer.to_string(),
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: now + i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
            iat: now,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = AccessClaims::new(
            "session-service",
            "user-123",
            "user@example.com",
            Duration::from_secs(900),
        );

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email, "user@example.com");
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_zero_ttl_is_expired() {
        let claims = AccessClaims::new(
            "session-service",
            "user-123",
            "user@example.com",
            Duration::from_secs(0),
        );
        // exp == iat; expired one second later at the latest.
        assert!(claims.exp <= Utc::now().timestamp());
    }
}
