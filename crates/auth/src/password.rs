//! Salted password hashing (bcrypt).
//!
//! Hashing and verification are CPU-bound, so both run on the blocking pool
//! instead of the async executor.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt cost {0} is out of range (4..=31)")]
    InvalidCost(u32),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub const DEFAULT_COST: u32 = 12;

    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(4..=31).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost)).await??;
        Ok(hashed)
    }

    /// Constant-time comparison of `plaintext` against a stored bcrypt hash.
    ///
    /// A stored value that is not a bcrypt hash never matches.
    pub async fn verify(&self, plaintext: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let plaintext = plaintext.to_owned();
        let stored_hash = stored_hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &stored_hash)).await?;
        match outcome {
            Ok(matched) => Ok(matched),
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is not a valid bcrypt hash");
                Ok(false)
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: Self::DEFAULT_COST }
    }
}
