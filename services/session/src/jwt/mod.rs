//! Access-token minting and verification.

pub mod claims;

pub use claims::AccessClaims;

use crate::error::SessionError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;

/// HS256 key pair for access tokens, shared by mint and verify sides.
pub struct AccessTokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl AccessTokenKeys {
    #[must_use]
    pub fn new(secret: &str, issuer: &str, ttl: Duration) -> Self {
        AccessTokenKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            ttl,
        }
    }

    /// Sign a fresh access token for a verified identity.
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn mint(&self, user_id: &str, email: &str) -> Result<String, SessionError> {
        let claims = AccessClaims::new(&self.issuer, user_id, email, self.ttl);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Verify signature, expiry, and issuer of a presented access token.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Jwt` on any validation failure.
    pub fn verify(&self, token: &str) -> Result<AccessClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        let data = decode::<AccessClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> AccessTokenKeys {
        AccessTokenKeys::new("test-secret", "session-service", Duration::from_secs(900))
    }

    #[test]
    fn test_mint_verify_roundtrip() {
        let keys = keys();
        let token = keys.mint("user-1", "u@example.com").unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "u@example.com");
        assert_eq!(claims.iss, "session-service");
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = keys().mint("user-1", "u@example.com").unwrap();
        let other = AccessTokenKeys::new("other-secret", "session-service", Duration::from_secs(900));
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = AccessTokenKeys::new("test-secret", "session-service", Duration::from_secs(0));
        let token = keys.mint("user-1", "u@example.com").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let token = AccessTokenKeys::new("test-secret", "someone-else", Duration::from_secs(900))
            .mint("user-1", "u@example.com")
            .unwrap();
        assert!(keys().verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(keys().verify("not-a-jwt").is_err());
    }
}
