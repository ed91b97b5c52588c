//! Centralized configuration for the session service.
//!
//! All configuration is loaded from environment variables and validated
//! at startup.

use crate::error::SessionError;
use std::env;
use std::time::Duration;

/// Session service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    // Token settings
    /// Access token issuer claim
    pub jwt_issuer: String,
    /// HMAC secret for access token signing
    pub jwt_secret: String,
    /// Access token TTL (short, minutes)
    pub access_token_ttl: Duration,
    /// Refresh token TTL (long, days)
    pub refresh_token_ttl: Duration,

    // Storage
    /// Postgres connection string for the revocation store
    pub database_url: String,

    // Observability
    /// Emit logs as JSON
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, SessionError> {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_env("PORT", 8080)?;

        let jwt_issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "session-service".to_string());
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            // Random per-process secret for development; every restart
            // invalidates outstanding access tokens.
            Err(_) => generate_dev_secret(),
        };

        let access_token_ttl = Duration::from_secs(parse_env("ACCESS_TOKEN_TTL", 900)?);
        let refresh_token_ttl = Duration::from_secs(parse_env("REFRESH_TOKEN_TTL", 604_800)?);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| SessionError::config("DATABASE_URL is required"))?;

        let log_json = parse_env("LOG_JSON", false)?;

        Ok(Self {
            host,
            port,
            jwt_issuer,
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
            database_url,
            log_json,
        })
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, SessionError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| SessionError::config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn generate_dev_secret() -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
