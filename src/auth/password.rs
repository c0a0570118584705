//! Password hashing utilities
//!
//! Passwords are stored as bcrypt hashes. The plaintext only ever lives in
//! the caller's stack frame; [`PasswordHash`] exposes comparison, never
//! recovery.

use std::fmt;

use bcrypt::DEFAULT_COST;
use thiserror::Error;
use tracing::warn;

/// bcrypt only reads the first 72 bytes of its input. Longer passwords are
/// rejected rather than silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Lowest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;

/// Highest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    Empty,

    #[error("password must be at most {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    #[error("failed to hash password: {0}")]
    Hashing(#[source] bcrypt::BcryptError),

    #[error("password does not match")]
    Mismatch,
}

/// Hashes passwords with a fixed bcrypt cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordError> {
        if plaintext.is_empty() {
            return Err(PasswordError::Empty);
        }
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong);
        }

        bcrypt::hash(plaintext, self.cost)
            .map(PasswordHash)
            .map_err(PasswordError::Hashing)
    }
}

/// One-way representation of a password.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash read back from storage.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// The encoded hash, for persistence only.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare a candidate password against this hash.
    ///
    /// A corrupt stored hash and a wrong password both come back as
    /// [`PasswordError::Mismatch`]. A candidate over the byte limit never
    /// matches, since no stored hash could have been made from it.
    pub fn verify(&self, candidate: &str) -> Result<(), PasswordError> {
        if candidate.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::Mismatch);
        }

        match bcrypt::verify(candidate, &self.0) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PasswordError::Mismatch),
            Err(e) => {
                warn!("Stored password hash could not be parsed: {}", e);
                Err(PasswordError::Mismatch)
            }
        }
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}
