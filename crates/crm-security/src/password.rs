//! Password hashing with Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

use crm_shared::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password must be at least {0} characters")]
    TooShort(usize),
    #[error("Password must be at most {0} characters")]
    TooLong(usize),
    #[error("Hash error: {0}")]
    HashError(String),
}

pub struct PasswordService;

impl PasswordService {
    /// Length policy applied at registration.
    pub fn check_policy(password: &str) -> Result<(), PasswordError> {
        let len = password.chars().count();
        if len < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort(MIN_PASSWORD_LENGTH));
        }
        if len > MAX_PASSWORD_LENGTH {
            return Err(PasswordError::TooLong(MAX_PASSWORD_LENGTH));
        }
        Ok(())
    }

    /// Returns the PHC-formatted hash.
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    /// A malformed stored hash is an error; a wrong password is `Ok(false)`.
    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordService::verify("hunter22", &hash).unwrap());
        assert!(!PasswordService::verify("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let a = PasswordService::hash("hunter22").unwrap();
        let b = PasswordService::hash("hunter22").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(PasswordService::verify("hunter22", "plaintext").is_err());
    }

    #[test]
    fn test_policy() {
        assert!(matches!(PasswordService::check_policy("abc"), Err(PasswordError::TooShort(6))));
        assert!(PasswordService::check_policy("abcdef").is_ok());
        let long = "x".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(PasswordService::check_policy(&long), Err(PasswordError::TooLong(_))));
    }
}
