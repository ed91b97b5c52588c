//! In-memory revocation store for tests and local development.

use crate::error::SessionError;
use crate::refresh::record::RefreshTokenRecord;
use crate::store::RevocationStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Map-backed [`RevocationStore`]. The single mutex makes every write,
/// including the rotation compare-and-swap, atomic.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, RefreshTokenRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record, for assertions in tests.
    pub async fn all_records(&self) -> Vec<RefreshTokenRecord> {
        self.records.lock().await.values().cloned().collect()
    }

    /// Count of non-revoked, unexpired records in one family.
    pub async fn active_count(&self, family_id: Uuid) -> usize {
        let now = Utc::now();
        self.records
            .lock()
            .await
            .values()
            .filter(|r| r.family_id == family_id && r.is_active_at(now))
            .count()
    }
}

#[async_trait]
impl RevocationStore for MemoryStore {
    async fn find_active_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, SessionError> {
        let now = Utc::now();
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|r| r.token_hash == hash && r.is_active_at(now))
            .cloned())
    }

    async fn find_any_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, SessionError> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|r| r.token_hash == hash)
            .cloned())
    }

    async fn revise_to_revoked(&self, id: Uuid) -> Result<bool, SessionError> {
        let mut records = self.records.lock().await;
        match records.get_mut(&id) {
            Some(record) if !record.revoked => {
                record.revoked = true;
                Ok(true)
            }
            // Already revoked or unknown: the transition did not happen.
            _ => Ok(false),
        }
    }

    async fn revise_family_to_revoked(&self, family_id: Uuid) -> Result<u64, SessionError> {
        let mut records = self.records.lock().await;
        let mut revoked = 0;
        for record in records.values_mut() {
            if record.family_id == family_id && !record.revoked {
                record.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn revise_user_to_revoked(&self, user_id: &str) -> Result<u64, SessionError> {
        let mut records = self.records.lock().await;
        let mut revoked = 0;
        for record in records.values_mut() {
            if record.user_id == user_id && !record.revoked {
                record.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), SessionError> {
        self.records
            .lock()
            .await
            .insert(record.id, record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(user: &str) -> RefreshTokenRecord {
        RefreshTokenRecord::root(user, "u@example.com", "hash".to_string(), Duration::days(7))
    }

    #[tokio::test]
    async fn test_revise_to_revoked_is_a_cas() {
        let store = MemoryStore::new();
        let r = record("user-1");
        store.insert(&r).await.unwrap();

        // Only the first revocation performs the transition.
        assert!(store.revise_to_revoked(r.id).await.unwrap());
        assert!(!store.revise_to_revoked(r.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_revise_to_revoked_unknown_id_is_a_noop() {
        let store = MemoryStore::new();
        assert!(!store.revise_to_revoked(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_active_excludes_expired() {
        let store = MemoryStore::new();
        let mut r = record("user-1");
        r.expires_at = Utc::now() - Duration::seconds(1);
        store.insert(&r).await.unwrap();

        assert!(store
            .find_active_by_hash(&r.token_hash)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_any_by_hash(&r.token_hash)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_family_revocation_spares_other_families() {
        let store = MemoryStore::new();
        let a = record("user-1");
        let b = record("user-1");
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        let revoked = store.revise_family_to_revoked(a.family_id).await.unwrap();
        assert_eq!(revoked, 1);
        assert!(store
            .find_active_by_hash(&b.token_hash)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_user_revocation_spans_families() {
        let store = MemoryStore::new();
        let a = record("user-1");
        let b = record("user-1");
        let other = record("user-2");
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();
        store.insert(&other).await.unwrap();

        let revoked = store.revise_user_to_revoked("user-1").await.unwrap();
        assert_eq!(revoked, 2);
        assert!(store
            .find_active_by_hash(&other.token_hash)
            .await
            .unwrap()
            .is_some());
    }
}
