//! Session issuance: the first access/refresh pair of a login.

use crate::error::SessionError;
use crate::jwt::AccessTokenKeys;
use crate::refresh::generator::{generate_secret, hash_secret};
use crate::refresh::record::RefreshTokenRecord;
use crate::store::RevocationStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Access/refresh pair handed to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints the first token pair of a new session, creating a fresh family.
///
/// Consumes an identity already verified by the credential verifier;
/// it never sees raw credentials.
pub struct SessionIssuer {
    store: Arc<dyn RevocationStore>,
    keys: Arc<AccessTokenKeys>,
    refresh_ttl: chrono::Duration,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(
        store: Arc<dyn RevocationStore>,
        keys: Arc<AccessTokenKeys>,
        refresh_ttl: std::time::Duration,
    ) -> Self {
        SessionIssuer {
            store,
            keys,
            refresh_ttl: chrono::Duration::from_std(refresh_ttl)
                .unwrap_or_else(|_| chrono::Duration::days(7)),
        }
    }

    /// Create a brand-new token family for a verified `(user_id, email)`.
    ///
    /// # Errors
    ///
    /// Persistence failure is fatal to the login and propagates.
    pub async fn issue(&self, user_id: &str, email: &str) -> Result<TokenPair, SessionError> {
        let secret = generate_secret();
        let root = RefreshTokenRecord::root(user_id, email, hash_secret(&secret), self.refresh_ttl);

        self.store.insert(&root).await?;

        let access_token = self.keys.mint(user_id, email)?;

        info!(
            family_id = %root.family_id,
            user_id = %user_id,
            "Issued new session family"
        );

        Ok(TokenPair {
            access_token,
            refresh_token: secret,
        })
    }
}
