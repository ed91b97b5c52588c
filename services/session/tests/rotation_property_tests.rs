//! Property-based tests for refresh token rotation.
//!
//! Properties covered:
//! - rotation invalidates the superseded token
//! - reuse of a superseded token revokes the entire family
//! - a family has exactly one active head after any rotation sequence
//! - plain expiry never cascades
//! - concurrent rotations of one head cannot both succeed

use proptest::prelude::*;
use session_service::error::SessionError;
use session_service::jwt::AccessTokenKeys;
use session_service::refresh::generator::{generate_secret, hash_secret};
use session_service::refresh::{RefreshTokenRecord, RotationEngine, SessionIssuer};
use session_service::store::{MemoryStore, RevocationStore};
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    store: Arc<MemoryStore>,
    issuer: SessionIssuer,
    rotator: RotationEngine,
    keys: Arc<AccessTokenKeys>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let keys = Arc::new(AccessTokenKeys::new(
        "test-secret",
        "session-service",
        Duration::from_secs(900),
    ));
    let refresh_ttl = Duration::from_secs(604_800);

    Harness {
        issuer: SessionIssuer::new(store.clone(), keys.clone(), refresh_ttl),
        rotator: RotationEngine::new(store.clone(), keys.clone(), refresh_ttl),
        store,
        keys,
    }
}

/// Generate arbitrary user IDs.
fn arb_user_id() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{8,32}"
}

/// Generate arbitrary email addresses.
fn arb_email() -> impl Strategy<Value = String> {
    "[a-z0-9]{3,12}@example\\.com"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// After rotation, the old refresh token must be invalid and only
    /// the new one usable.
    #[test]
    fn prop_rotation_invalidates_old_token(
        user_id in arb_user_id(),
        email in arb_email(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = harness();

            let pair0 = h.issuer.issue(&user_id, &email).await.unwrap();
            let pair1 = h.rotator.rotate(&pair0.refresh_token).await.unwrap();

            prop_assert_ne!(&pair0.refresh_token, &pair1.refresh_token);

            // The new token keeps working.
            let pair2 = h.rotator.rotate(&pair1.refresh_token).await.unwrap();
            prop_assert_ne!(&pair1.refresh_token, &pair2.refresh_token);

            // Minted access tokens carry the verified identity.
            let claims = h.keys.verify(&pair2.access_token).unwrap();
            prop_assert_eq!(&claims.sub, &user_id);
            prop_assert_eq!(&claims.email, &email);

            Ok(())
        })?;
    }

    /// Replaying a superseded token revokes every record in the family,
    /// including heads created after the replayed token was rotated.
    #[test]
    fn prop_reuse_cascades_whole_family(
        user_id in arb_user_id(),
        email in arb_email(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = harness();

            // login -> R0, rotate -> R1, rotate -> R2
            let r0 = h.issuer.issue(&user_id, &email).await.unwrap();
            let r1 = h.rotator.rotate(&r0.refresh_token).await.unwrap();
            let r2 = h.rotator.rotate(&r1.refresh_token).await.unwrap();

            // Attacker replays R0.
            let replay = h.rotator.rotate(&r0.refresh_token).await;
            prop_assert!(matches!(replay, Err(SessionError::ReuseDetected)));

            // Legitimate use of the current head R2 now fails too.
            let after = h.rotator.rotate(&r2.refresh_token).await;
            prop_assert!(matches!(after, Err(SessionError::ReuseDetected)));

            // Nothing in the family is left active.
            let family_id = h.store.all_records().await[0].family_id;
            prop_assert_eq!(h.store.active_count(family_id).await, 0);

            Ok(())
        })?;
    }

    /// Exactly one record per family is simultaneously non-revoked and
    /// unexpired after any sequence of rotations.
    #[test]
    fn prop_single_active_head(
        user_id in arb_user_id(),
        email in arb_email(),
        rotations in 1usize..10,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = harness();

            let mut current = h.issuer.issue(&user_id, &email).await.unwrap();
            let family_id = h.store.all_records().await[0].family_id;

            for _ in 0..rotations {
                prop_assert_eq!(h.store.active_count(family_id).await, 1);
                current = h.rotator.rotate(&current.refresh_token).await.unwrap();
            }

            prop_assert_eq!(h.store.active_count(family_id).await, 1);

            // Lineage: every non-root record points at its parent.
            let records = h.store.all_records().await;
            let roots = records.iter().filter(|r| r.parent_token_id.is_none()).count();
            prop_assert_eq!(roots, 1);
            prop_assert_eq!(records.len(), rotations + 1);

            Ok(())
        })?;
    }
}

#[tokio::test]
async fn test_plain_expiry_does_not_cascade() {
    let h = harness();

    // A family whose old head expired naturally, with a live successor.
    let expired_secret = generate_secret();
    let mut expired = RefreshTokenRecord::root(
        "user-1",
        "u@example.com",
        hash_secret(&expired_secret),
        chrono::Duration::days(7),
    );
    expired.expires_at = chrono::Utc::now() - chrono::Duration::seconds(10);

    let live_secret = generate_secret();
    let mut live = expired.child(hash_secret(&live_secret), chrono::Duration::days(7));
    live.expires_at = chrono::Utc::now() + chrono::Duration::days(7);

    h.store.insert(&expired).await.unwrap();
    h.store.insert(&live).await.unwrap();

    let result = h.rotator.rotate(&expired_secret).await;
    assert!(matches!(result, Err(SessionError::ExpiredToken)));

    // The live head is untouched.
    assert_eq!(h.store.active_count(expired.family_id).await, 1);
    assert!(h.rotator.rotate(&live_secret).await.is_ok());
}

#[tokio::test]
async fn test_unknown_token_is_invalid_without_cascade() {
    let h = harness();
    let pair = h.issuer.issue("user-1", "u@example.com").await.unwrap();

    let result = h.rotator.rotate("fabricated-token").await;
    assert!(matches!(result, Err(SessionError::InvalidToken)));

    // The real session is unaffected.
    assert!(h.rotator.rotate(&pair.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_rotations_of_one_head() {
    let h = Arc::new(harness());
    let pair = h.issuer.issue("user-1", "u@example.com").await.unwrap();

    let a = {
        let h = h.clone();
        let secret = pair.refresh_token.clone();
        tokio::spawn(async move { h.rotator.rotate(&secret).await })
    };
    let b = {
        let h = h.clone();
        let secret = pair.refresh_token.clone();
        tokio::spawn(async move { h.rotator.rotate(&secret).await })
    };

    let a = a.await.unwrap();
    let b = b.await.unwrap();

    // The conditional revoke lets at most one rotation win; the loser
    // is indistinguishable from reuse and cascades. Depending on the
    // interleaving the winner's child may or may not be caught by that
    // cascade, but the single-head invariant always holds.
    let wins = usize::from(a.is_ok()) + usize::from(b.is_ok());
    assert_eq!(wins, 1);

    let family_id = h.store.all_records().await[0].family_id;
    assert!(h.store.active_count(family_id).await <= 1);
}

#[tokio::test]
async fn test_logout_revokes_presented_family() {
    let h = harness();
    let pair = h.issuer.issue("user-1", "u@example.com").await.unwrap();
    let rotated = h.rotator.rotate(&pair.refresh_token).await.unwrap();

    h.rotator.revoke_presented(&rotated.refresh_token).await.unwrap();

    let result = h.rotator.rotate(&rotated.refresh_token).await;
    assert!(matches!(result, Err(SessionError::ReuseDetected)));
}

#[tokio::test]
async fn test_logout_all_spans_families() {
    let h = harness();
    let phone = h.issuer.issue("user-1", "u@example.com").await.unwrap();
    let laptop = h.issuer.issue("user-1", "u@example.com").await.unwrap();
    let other = h.issuer.issue("user-2", "o@example.com").await.unwrap();

    let revoked = h.rotator.revoke_all_for_user("user-1").await.unwrap();
    assert_eq!(revoked, 2);

    assert!(h.rotator.rotate(&phone.refresh_token).await.is_err());
    assert!(h.rotator.rotate(&laptop.refresh_token).await.is_err());
    assert!(h.rotator.rotate(&other.refresh_token).await.is_ok());
}
