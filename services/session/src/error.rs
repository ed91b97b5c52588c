use thiserror::Error;

/// Errors produced by the session service.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Presented refresh token matches no record at all.
    #[error("refresh token not recognized")]
    InvalidToken,

    /// Presented refresh token exists but is past its expiry.
    #[error("refresh token expired")]
    ExpiredToken,

    /// Presented refresh token was already superseded. The whole family
    /// has been revoked.
    #[error("refresh token reuse detected, family revoked")]
    ReuseDetected,

    /// Access token could not be signed or verified.
    #[error("JWT error: {0}")]
    Jwt(String),

    /// Revocation store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Catch-all internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Build a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Token-level rejections are all reported to clients as a generic
    /// unauthorized response; anything else is a server fault.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken | Self::ExpiredToken | Self::ReuseDetected
        )
    }
}

impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for SessionError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(err.to_string())
    }
}

// Error codes for server-side logs; never sent on the wire.
pub const TOKEN_INVALID: &str = "TOKEN_INVALID";
pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
pub const TOKEN_REUSED: &str = "TOKEN_REUSED";
