/**
 * Password Hashing
 *
 * One-way credential hashing and verification built on bcrypt.
 *
 * # Security
 *
 * - Cost factor 12 (work factor doubles per increment)
 * - Random per-hash salt: hashing the same plaintext twice yields
 *   different digests, both of which verify
 * - Verification never panics; a malformed digest verifies as false
 *
 * Hashing is CPU-bound. Handlers run these functions inside
 * `tokio::task::spawn_blocking` so the request executor is not stalled.
 */

use bcrypt::{hash, verify, BcryptError};

/// bcrypt work factor used for all stored credentials
pub const BCRYPT_COST: u32 = 12;

/// Hash a plaintext password for storage
///
/// # Errors
///
/// Returns `BcryptError` if the bcrypt primitive fails (effectively
/// only on invalid cost or RNG failure).
pub fn hash_password(plaintext: &str) -> Result<String, BcryptError> {
    hash(plaintext, BCRYPT_COST)
}

/// Verify a plaintext password against a stored digest
///
/// Returns `false` for a wrong password and for a malformed digest;
/// the comparison inside bcrypt is constant-time.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    verify(plaintext, digest).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let digest = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &digest));
        assert!(!verify_password("wrong password", &digest));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("secret123").unwrap();
        let second = hash_password("secret123").unwrap();
        // Different salts produce different digests, both verify.
        assert_ne!(first, second);
        assert!(verify_password("secret123", &first));
        assert!(verify_password("secret123", &second));
    }

    #[test]
    fn test_verify_malformed_digest_is_false() {
        assert!(!verify_password("anything", "not-a-bcrypt-digest"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_digest_encodes_cost() {
        let digest = hash_password("pw").unwrap();
        assert!(digest.starts_with("$2") && digest.contains("$12$"));
    }
}
