//! Client token cache: the persisted slice of session state.
//!
//! Only the token pair and a user snapshot survive restarts; the
//! refresh coordinator's state is volatile by design and lives in
//! [`crate::coordinator`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Cached snapshot of the signed-in user, so the UI can render before
/// any network round-trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub user_id: String,
    pub email: String,
}

/// The persisted session state: current token pair plus user snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CachedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Option<UserSnapshot>,
}

/// Storage seam over the platform's secure store (keychain, keystore,
/// encrypted prefs). Implementations must be safe for concurrent use.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the persisted session, if any.
    async fn load(&self) -> Option<CachedSession>;

    /// Replace the persisted session.
    async fn save(&self, session: CachedSession);

    /// Full teardown: forget everything.
    async fn clear(&self);
}

/// In-memory [`TokenStore`] for tests and short-lived processes.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: RwLock<Option<CachedSession>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store, convenient in tests.
    #[must_use]
    pub fn with_session(session: CachedSession) -> Self {
        MemoryTokenStore {
            inner: RwLock::new(Some(session)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Option<CachedSession> {
        self.inner.read().await.clone()
    }

    async fn save(&self, session: CachedSession) {
        *self.inner.write().await = Some(session);
    }

    async fn clear(&self) {
        *self.inner.write().await = None;
    }
}
