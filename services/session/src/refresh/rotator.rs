//! Refresh-token rotation with reuse detection.
//!
//! Per-record state machine: `ISSUED -> {ROTATED | REVOKED | EXPIRED}`,
//! all terminal. A rotated record is a revoked record with a child
//! pointing at it; expiry is implicit and checked as a state.

use crate::error::{SessionError, TOKEN_EXPIRED, TOKEN_INVALID, TOKEN_REUSED};
use crate::jwt::AccessTokenKeys;
use crate::refresh::generator::{generate_secret, hash_secret};
use crate::refresh::issuer::TokenPair;
use crate::refresh::record::{RefreshTokenRecord, TokenState};
use crate::store::RevocationStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Validates a presented refresh token and either rotates the family
/// head or cascades revocation on reuse.
pub struct RotationEngine {
    store: Arc<dyn RevocationStore>,
    keys: Arc<AccessTokenKeys>,
    refresh_ttl: chrono::Duration,
}

impl RotationEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn RevocationStore>,
        keys: Arc<AccessTokenKeys>,
        refresh_ttl: std::time::Duration,
    ) -> Self {
        RotationEngine {
            store,
            keys,
            refresh_ttl: chrono::Duration::from_std(refresh_ttl)
                .unwrap_or_else(|_| chrono::Duration::days(7)),
        }
    }

    /// Exchange a presented refresh token for a new access/refresh pair.
    ///
    /// # Errors
    ///
    /// - `ReuseDetected`: the token was already superseded; the whole
    ///   family has been revoked.
    /// - `ExpiredToken`: past `expires_at`, never rotated. No cascade.
    /// - `InvalidToken`: matches no record. No cascade.
    /// - `Storage`/`Jwt`: infrastructure failures.
    pub async fn rotate(&self, presented: &str) -> Result<TokenPair, SessionError> {
        let hash = hash_secret(presented);

        if let Some(head) = self.store.find_active_by_hash(&hash).await? {
            return self.rotate_head(head).await;
        }

        match self.store.find_any_by_hash(&hash).await? {
            Some(record) => match record.state_at(Utc::now()) {
                TokenState::Revoked => {
                    self.cascade(&record).await?;
                    Err(SessionError::ReuseDetected)
                }
                // Natural expiry is not evidence of theft.
                TokenState::Expired => {
                    debug!(
                        event = TOKEN_EXPIRED,
                        family_id = %record.family_id,
                        "refresh token past expiry"
                    );
                    Err(SessionError::ExpiredToken)
                }
                // The active lookup raced a concurrent rotation; the
                // revoked branch above will catch it on re-presentation.
                TokenState::Active => Err(SessionError::InvalidToken),
            },
            None => {
                debug!(event = TOKEN_INVALID, "refresh token matches no record");
                Err(SessionError::InvalidToken)
            }
        }
    }

    /// Revoke the family of a presented refresh token (logout with a
    /// token in hand). The family is the unit of trust, so logout takes
    /// the whole lineage with it. Unknown tokens are a no-op.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn revoke_presented(&self, presented: &str) -> Result<(), SessionError> {
        let hash = hash_secret(presented);
        if let Some(record) = self.store.find_any_by_hash(&hash).await? {
            let revoked = self.store.revise_family_to_revoked(record.family_id).await?;
            info!(
                family_id = %record.family_id,
                user_id = %record.user_id,
                revoked,
                "Revoked session family on logout"
            );
        }
        Ok(())
    }

    /// Revoke every session of a user (logout-all, password reset).
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub async fn revoke_all_for_user(&self, user_id: &str) -> Result<u64, SessionError> {
        let revoked = self.store.revise_user_to_revoked(user_id).await?;
        info!(user_id = %user_id, revoked, "Revoked all sessions for user");
        Ok(revoked)
    }

    /// Legitimate head: revoke it and insert its successor. The
    /// conditional revoke is the exclusivity point; losing it means a
    /// concurrent rotation already consumed this head, which is exactly
    /// the reuse situation.
    async fn rotate_head(&self, head: RefreshTokenRecord) -> Result<TokenPair, SessionError> {
        if !self.store.revise_to_revoked(head.id).await? {
            self.cascade(&head).await?;
            return Err(SessionError::ReuseDetected);
        }

        let secret = generate_secret();
        let child = head.child(hash_secret(&secret), self.refresh_ttl);
        self.store.insert(&child).await?;

        let access_token = self.keys.mint(&head.user_id, &head.email)?;

        info!(
            family_id = %head.family_id,
            parent_token_id = %head.id,
            "Rotated refresh token"
        );

        Ok(TokenPair {
            access_token,
            refresh_token: secret,
        })
    }

    /// Reuse observed: the service cannot tell the legitimate holder
    /// from a thief who captured the token before rotation, so the
    /// entire lineage dies. The only branch logged as a security event.
    async fn cascade(&self, record: &RefreshTokenRecord) -> Result<(), SessionError> {
        let revoked = self.store.revise_family_to_revoked(record.family_id).await?;

        warn!(
            event = TOKEN_REUSED,
            family_id = %record.family_id,
            user_id = %record.user_id,
            revoked,
            "Refresh token reuse detected, revoked entire family"
        );

        Ok(())
    }
}
