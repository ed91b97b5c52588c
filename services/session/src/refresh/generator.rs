//! Opaque refresh-token secrets.
//!
//! The secret handed to clients is 32 random bytes, URL-safe base64
//! encoded. Only its SHA-256 hash is ever persisted.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a fresh opaque refresh secret.
#[must_use]
pub fn generate_secret() -> String {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// One-way hash of a refresh secret, as stored in the revocation store.
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_are_unique() {
        let a = generate_secret();
        let b = generate_secret();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43); // base64 of 32 bytes, unpadded
    }

    #[test]
    fn test_hash_deterministic() {
        let secret = generate_secret();
        assert_eq!(hash_secret(&secret), hash_secret(&secret));
    }

    #[test]
    fn test_hash_never_echoes_secret() {
        let secret = generate_secret();
        assert_ne!(hash_secret(&secret), secret);
    }
}
