use thiserror::Error;

/// Client-side failure taxonomy.
///
/// `Clone` because the refresh coordinator fans one outcome out to
/// every concurrent waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The session is gone; the cache has been cleared and the
    /// application must re-authenticate.
    #[error("session expired, re-authentication required")]
    SessionExpired,

    /// No cached session to work with.
    #[error("no cached session")]
    NoSession,

    /// Transient transport failure; the caller may retry, the
    /// coordinator itself never does.
    #[error("network error: {0}")]
    Network(String),

    /// The refresh call exceeded its bounded timeout.
    #[error("refresh timed out")]
    Timeout,

    /// A token that should be a JWT could not be parsed.
    #[error("malformed token: {0}")]
    MalformedToken(String),
}

impl ClientError {
    /// Transient failures may be retried by the caller without tearing
    /// down the session; terminal ones force a return to login.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}
