//! Persisted refresh-token records and their lineage.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived lifecycle state of a record at a point in time.
///
/// `Revoked` covers both explicit revocation and rotation; a rotated
/// record is a revoked record with a child pointing at it. Expiry is
/// implicit and never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Usable head of its family.
    Active,
    /// Revoked (rotated away, logged out, or caught in a reuse cascade).
    Revoked,
    /// Past `expires_at`, never revoked.
    Expired,
}

/// One row of the revocation store ledger.
///
/// Records are never hard-deleted during a session's life; `revoked` is
/// monotonic false -> true.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: String,
    pub email: String,
    pub family_id: Uuid,
    /// `None` only for the family root.
    pub parent_token_id: Option<Uuid>,
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshTokenRecord {
    /// Root record for a brand-new family.
    #[must_use]
    pub fn root(user_id: &str, email: &str, token_hash: String, ttl: Duration) -> Self {
        let now = Utc::now();
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            email: email.to_string(),
            family_id: Uuid::new_v4(),
            parent_token_id: None,
            token_hash,
            issued_at: now,
            expires_at: now + ttl,
            revoked: false,
        }
    }

    /// Successor record minted by a rotation of `self`.
    #[must_use]
    pub fn child(&self, token_hash: String, ttl: Duration) -> Self {
        let now = Utc::now();
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            family_id: self.family_id,
            parent_token_id: Some(self.id),
            token_hash,
            issued_at: now,
            expires_at: now + ttl,
            revoked: false,
        }
    }

    /// State of the record at `now`. Revocation takes precedence over
    /// expiry: replaying a rotated-then-expired token is still reuse.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.revoked {
            TokenState::Revoked
        } else if self.expires_at <= now {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }

    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == TokenState::Active
    }
}
