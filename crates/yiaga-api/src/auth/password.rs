//! Password hashing.
//!
//! Digests are argon2id PHC strings with a per-password random salt and the
//! crate's default work factor.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Hash a plaintext password.
///
/// # Errors
///
/// Returns `AuthError::Hashing` if argon2 fails internally.
pub fn hash(plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check a plaintext password against a stored digest.
///
/// A malformed digest is a mismatch, not an error.
#[must_use]
pub fn verify(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let digest = hash("correct horse").unwrap();
        assert!(digest.starts_with("$argon2"));
        assert!(verify("correct horse", &digest));
        assert!(!verify("correct horse!", &digest));
        assert!(!verify("", &digest));
    }

    #[test]
    fn test_salted() {
        let a = hash("same").unwrap();
        let b = hash("same").unwrap();
        assert_ne!(a, b);
        assert!(verify("same", &a));
        assert!(verify("same", &b));
    }

    #[test]
    fn test_malformed_digest() {
        assert!(!verify("anything", "not-a-digest"));
        assert!(!verify("anything", ""));
        assert!(!verify("anything", "$2a$10$bcryptlookingvalue"));
    }
}
