//! Salted password hashing for stored credentials.
//!
//! # Invariants
//! - Stored hashes are Argon2id PHC strings with a random 16-byte salt.
//! - Verification against an unparseable stored hash fails closed.

use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use password_hash::{PasswordHash, SaltString};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Initial password assigned to newly created accounts.
pub const DEFAULT_PASSWORD: &str = "123456";

const SALT_LEN: usize = 16;

/// Failures while producing a password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The OS random source could not provide salt bytes.
    Entropy(String),
    /// Invalid cost parameters or a hashing backend failure.
    Hash(String),
}

impl Display for PasswordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entropy(message) => write!(f, "failed to gather salt entropy: {message}"),
            Self::Hash(message) => write!(f, "failed to hash password: {message}"),
        }
    }
}

impl Error for PasswordError {}

/// Argon2id hasher with configurable cost.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl Debug for CredentialHasher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl CredentialHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a hasher with explicit memory (KiB), iteration, and lane costs.
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|err| PasswordError::Hash(err.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|err| PasswordError::Entropy(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|err| PasswordError::Hash(err.to_string()))?;
        let phc = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|err| PasswordError::Hash(err.to_string()))?;
        Ok(phc.to_string())
    }

    /// Returns whether `plain` matches the stored PHC hash.
    ///
    /// Parameters embedded in the stored hash take precedence over this
    /// hasher's configured cost.
    pub fn verify(&self, plain: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialHasher, DEFAULT_PASSWORD};

    fn cheap_hasher() -> CredentialHasher {
        CredentialHasher::with_cost(8, 1, 1).expect("minimum argon2 cost is valid")
    }

    #[test]
    fn hash_then_verify() {
        let hasher = cheap_hasher();
        let stored = hasher.hash(DEFAULT_PASSWORD).unwrap();

        assert!(stored.starts_with("$argon2id$"));
        assert!(hasher.verify(DEFAULT_PASSWORD, &stored));
        assert!(!hasher.verify("654321", &stored));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = cheap_hasher();
        let first = hasher.hash("secret").unwrap();
        let second = hasher.hash("secret").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn unparseable_stored_hash_fails_closed() {
        let hasher = cheap_hasher();
        assert!(!hasher.verify("123456", "e10adc3949ba59abbe56e057f20f883e"));
        assert!(!hasher.verify("123456", ""));
    }

    #[test]
    fn invalid_cost_is_rejected() {
        assert!(CredentialHasher::with_cost(0, 0, 0).is_err());
    }
}
