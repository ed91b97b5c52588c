//! Revocation store: the persisted ledger of refresh-token records.
//!
//! Sole source of truth for validity, lineage, and revocation. The
//! backend is swappable behind [`RevocationStore`]; production uses
//! Postgres, tests and local runs use the in-memory backend.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::error::SessionError;
use crate::refresh::record::RefreshTokenRecord;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence contract for refresh-token records.
///
/// All writes are idempotent under retry. `revise_to_revoked` doubles as
/// the rotation compare-and-swap: it returns `true` only for the call
/// that performed the false -> true transition, so at most one rotation
/// can succeed from a given head even under concurrent requests.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Look up the record for `hash` that is non-revoked and unexpired.
    async fn find_active_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, SessionError>;

    /// Look up the record for `hash` regardless of state.
    async fn find_any_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, SessionError>;

    /// Conditionally revoke one record. Returns `true` if this call
    /// flipped `revoked`, `false` if it already was (a no-op, not an
    /// error).
    async fn revise_to_revoked(&self, id: Uuid) -> Result<bool, SessionError>;

    /// Revoke every record in a family, whatever its state. Best-effort
    /// with respect to records inserted mid-call.
    async fn revise_family_to_revoked(&self, family_id: Uuid) -> Result<u64, SessionError>;

    /// Revoke every record belonging to a user, across all families.
    async fn revise_user_to_revoked(&self, user_id: &str) -> Result<u64, SessionError>;

    /// Persist a new record (family root or rotation child).
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), SessionError>;
}
