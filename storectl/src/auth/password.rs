//! Password hashing and verification.
//!
//! New credentials are Argon2id PHC strings. Rows imported from the previous
//! system instead store a hex SHA-256 digest of the password concatenated with
//! a per-user salt. [`verify_password`] inspects the stored verifier's shape
//! and picks the matching scheme, so both kinds of account can log in.

use anyhow::anyhow;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Argon2 cost parameters, taken from [`crate::config::PasswordConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> anyhow::Result<Argon2<'static>> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a password into an Argon2id PHC string with explicit cost parameters.
///
/// CPU-bound; call from `spawn_blocking` on request paths.
pub fn hash_string_with_params(password: &str, params: Argon2Params) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .to_argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored verifier, dispatching on its shape.
///
/// - PHC strings (`$argon2...`) are verified with Argon2.
/// - 64 lowercase hex characters are treated as a legacy
///   `sha256(password || salt)` digest; `salt` must be the stored per-user
///   salt for these rows.
///
/// Anything else fails verification. Malformed verifiers are a login failure,
/// not an error.
pub fn verify_password(password: &str, verifier: &str, salt: Option<&str>) -> bool {
    if verifier.starts_with("$argon2") {
        let Ok(parsed) = PasswordHash::new(verifier) else {
            return false;
        };
        return Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok();
    }

    if is_hex_digest(verifier) {
        let Some(salt) = salt else {
            return false;
        };
        return legacy_digest(password, salt) == verifier;
    }

    false
}

fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// The legacy scheme: hex-encoded SHA-256 of password bytes followed by salt
/// bytes.
pub fn legacy_digest(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate an opaque session token: 32 random bytes, hex-encoded to 64
/// characters.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a salt for legacy-format credentials (16 hex characters).
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 8];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params() -> Argon2Params {
        // Minimal cost so tests stay fast
        Argon2Params { memory_kib: 8, iterations: 1, parallelism: 1 }
    }

    #[test]
    fn test_argon2_roundtrip() {
        let hash = hash_string_with_params("Secret123", test_params()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Secret123", &hash, None));
        assert!(!verify_password("Secret124", &hash, None));
    }

    #[test]
    fn test_argon2_ignores_salt_argument() {
        let hash = hash_string_with_params("Secret123", test_params()).unwrap();
        assert!(verify_password("Secret123", &hash, Some("deadbeefdeadbeef")));
    }

    #[test]
    fn test_legacy_digest_roundtrip() {
        let salt = "0123456789abcdef";
        let digest = legacy_digest("hunter2", salt);
        assert_eq!(digest.len(), 64);
        assert!(verify_password("hunter2", &digest, Some(salt)));
        assert!(!verify_password("hunter3", &digest, Some(salt)));
        // Wrong salt fails too
        assert!(!verify_password("hunter2", &digest, Some("ffffffffffffffff")));
    }

    #[test]
    fn test_legacy_digest_without_salt_fails() {
        let digest = legacy_digest("hunter2", "0123456789abcdef");
        assert!(!verify_password("hunter2", &digest, None));
    }

    #[test]
    fn test_malformed_verifier_fails_closed() {
        assert!(!verify_password("anything", "", None));
        assert!(!verify_password("anything", "not-a-hash", None));
        // Uppercase hex is not a legacy digest
        let upper = "A".repeat(64);
        assert!(!verify_password("anything", &upper, Some("0123456789abcdef")));
        // Truncated PHC prefix
        assert!(!verify_password("anything", "$argon2id$broken", None));
    }

    #[test]
    fn test_session_token_shape() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(token, generate_session_token());
    }

    #[test]
    fn test_salt_shape() {
        let salt = generate_salt();
        assert_eq!(salt.len(), 16);
        assert!(salt.bytes().all(|b| b.is_ascii_hexdigit()));
    }
}
