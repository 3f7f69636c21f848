//! Password hashing (bcrypt).
//!
//! Verification deliberately collapses every failure into `false`, so a
//! caller cannot tell a wrong password from a corrupt stored digest.

use thiserror::Error;

use crate::config::{DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    HashingFailed(String),

    #[error("bcrypt cost {0} out of range")]
    InvalidCost(u32),
}

/// Salted, cost-tunable one-way hashing of credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `plaintext` with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// `true` only when `plaintext` matches `digest`.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordHasher {
        PasswordHasher::new(MIN_BCRYPT_COST).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = fast();
        let digest = hasher.hash("admin123").unwrap();

        assert!(digest.starts_with("$2b$04$"));
        assert!(hasher.verify("admin123", &digest));
        assert!(!hasher.verify("admin124", &digest));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let hasher = fast();
        let a = hasher.hash("s3cret").unwrap();
        let b = hasher.hash("s3cret").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("s3cret", &a));
        assert!(hasher.verify("s3cret", &b));
    }

    #[test]
    fn malformed_digest_is_just_false() {
        let hasher = fast();
        assert!(!hasher.verify("anything", "not-a-bcrypt-digest"));
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn unicode_passwords_hash() {
        let hasher = fast();
        let digest = hasher.hash("contraseña-店").unwrap();
        assert!(hasher.verify("contraseña-店", &digest));
    }

    #[test]
    fn cost_outside_bcrypt_range_is_rejected() {
        assert_eq!(PasswordHasher::new(3), Err(PasswordError::InvalidCost(3)));
        assert_eq!(PasswordHasher::new(32), Err(PasswordError::InvalidCost(32)));
        assert_eq!(PasswordHasher::default().cost(), 10);
    }
}
