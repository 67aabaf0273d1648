//! Password hashing and verification.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings in the
//! plugin's credential table. Verification parses whatever PHC string is
//! stored, so parameter upgrades never invalidate existing hashes.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum accepted password length.
pub const MAX_PASSWORD_LEN: usize = 128;

/// Hash a password for storage, producing a PHC string.
///
/// # Errors
///
/// Returns the underlying hasher error; callers treat this as an internal
/// failure since it cannot be caused by user input.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
///
/// Returns `false` for a mismatch and for an unparseable stored hash; the
/// comparison inside Argon2 is constant-time.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Check a plaintext password against the length policy.
#[must_use]
pub fn acceptable_password(password: &str) -> bool {
    let chars = password.chars().count();
    (MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("hunter42").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter42", &hash));
    }

    #[test]
    fn wrong_password_fails_verification() {
        let hash = hash_password("hunter42").unwrap();
        assert!(!verify_password("hunter43", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_stored_hash_verifies_false() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn password_policy_bounds() {
        assert!(!acceptable_password("short"));
        assert!(acceptable_password("slightly-longer"));
        assert!(acceptable_password(&"x".repeat(MAX_PASSWORD_LEN)));
        assert!(!acceptable_password(&"x".repeat(MAX_PASSWORD_LEN + 1)));
    }
}
