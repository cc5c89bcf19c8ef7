//! Password hashing with Argon2 and password strength rules.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::OnceLock;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hash error: {0}")]
    HashError(String),
    #[error("{0}")]
    TooWeak(&'static str),
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    /// Returns `Ok(false)` on mismatch; errors only when `hash` is not a PHC string.
    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// [`Self::hash`] on the blocking thread pool.
    pub async fn hash_blocking(password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || Self::hash(&password))
            .await
            .map_err(|e| PasswordError::HashError(e.to_string()))?
    }

    /// Verify on the blocking thread pool, treating any error as a mismatch.
    ///
    /// Without a stored hash the password is still checked against a dummy
    /// hash, so unknown usernames cost one Argon2 verification like known ones.
    pub async fn verify_blocking(password: &str, hash: Option<String>) -> bool {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || match hash {
            Some(hash) => Self::verify(&password, &hash).unwrap_or(false),
            None => {
                if let Some(dummy) = dummy_hash() {
                    let _ = Self::verify(&password, dummy);
                }
                false
            }
        })
        .await
        .unwrap_or(false)
    }

    /// Check the strength rules in order, reporting the first one broken.
    pub fn validate_strength(password: &str) -> Result<(), PasswordError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PasswordError::TooWeak(
                "Password must be at least 8 characters long.",
            ));
        }
        if !password.chars().any(|c| c.is_numeric()) {
            return Err(PasswordError::TooWeak(
                "Password must contain at least one numeral.",
            ));
        }
        if !password.chars().any(|c| c.is_alphabetic()) {
            return Err(PasswordError::TooWeak(
                "Password must contain at least one letter.",
            ));
        }
        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(PasswordError::TooWeak(
                "Password must contain at least one uppercase letter.",
            ));
        }
        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(PasswordError::TooWeak(
                "Password must contain at least one lowercase letter.",
            ));
        }
        Ok(())
    }
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| PasswordService::hash("unused-login-password").ok())
        .as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = PasswordService::hash("Secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordService::verify("Secret123", &hash).unwrap());
        assert!(!PasswordService::verify("secret123", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(PasswordService::verify("Secret123", "not-a-hash").is_err());
    }

    #[tokio::test]
    async fn blocking_hash_and_verify() {
        let hash = PasswordService::hash_blocking("Secret123").await.unwrap();
        assert!(PasswordService::verify_blocking("Secret123", Some(hash.clone())).await);
        assert!(!PasswordService::verify_blocking("Secret124", Some(hash)).await);
        assert!(!PasswordService::verify_blocking("Secret123", Some("not-a-hash".into())).await);
    }

    #[tokio::test]
    async fn missing_hash_checks_dummy_and_fails() {
        let dummy = dummy_hash().unwrap();
        assert!(dummy.starts_with("$argon2"));
        assert!(PasswordHash::new(dummy).is_ok());
        assert!(!PasswordService::verify_blocking("unused-login-password", None).await);
        assert!(!PasswordService::verify_blocking("Secret123", None).await);
    }

    #[test]
    fn strength_rules_report_first_failure() {
        let cases = [
            ("Ab1", "at least 8 characters"),
            ("Abcdefgh", "numeral"),
            ("12345678", "letter"),
            ("abcdefg1", "uppercase"),
            ("ABCDEFG1", "lowercase"),
        ];
        for (password, fragment) in cases {
            let err = PasswordService::validate_strength(password).unwrap_err();
            assert!(
                err.to_string().contains(fragment),
                "{password}: {err}"
            );
        }
        assert!(PasswordService::validate_strength("Secret123").is_ok());
    }
}
