//! Salted password hashing (bcrypt).

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::error;

use crate::error::{ConfigError, StorageError};

/// A validated bcrypt cost.
///
/// Out-of-range values are a configuration error, never a per-request one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct WorkFactor(u32);

impl WorkFactor {
    pub const MIN: u32 = 4;
    pub const MAX: u32 = 20;

    pub fn new(value: u32) -> Result<Self, ConfigError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ConfigError::WorkFactor { value });
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for WorkFactor {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<u32> for WorkFactor {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkFactor> for u32 {
    fn from(wf: WorkFactor) -> Self {
        wf.0
    }
}

/// A stored password hash.
///
/// # Security
///
/// Never displayed in Debug output. Serializable only so storage backends can
/// persist it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PasswordHash").field(&"[REDACTED]").finish()
    }
}

/// Hashes and verifies passwords at a fixed work factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher {
    work_factor: WorkFactor,
}

impl PasswordHasher {
    pub fn new(work_factor: WorkFactor) -> Self {
        Self { work_factor }
    }

    pub fn work_factor(&self) -> WorkFactor {
        self.work_factor
    }

    /// Hash a plaintext password with a fresh salt.
    pub fn hash(&self, password: &str) -> Result<PasswordHash, StorageError> {
        bcrypt::hash(password, self.work_factor.get())
            .map(PasswordHash)
            .map_err(|e| {
                error!(error = %e, "Error hashing password");
                StorageError::Hashing {
                    message: e.to_string(),
                }
            })
    }

    /// Compare a candidate against a stored hash.
    ///
    /// Never fails: a malformed hash or any library error counts as a mismatch.
    pub fn verify(&self, candidate: &str, hash: &PasswordHash) -> bool {
        match bcrypt::verify(candidate, hash.as_str()) {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, "Error comparing password");
                false
            }
        }
    }

    /// [`hash`](Self::hash) on the blocking pool.
    ///
    /// The calling task keeps yielding while bcrypt runs, so a deadline on
    /// the caller can still fire.
    pub async fn hash_blocking(&self, password: &str) -> Result<PasswordHash, StorageError> {
        let hasher = *self;
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| StorageError::Hashing {
                message: e.to_string(),
            })?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    pub async fn verify_blocking(&self, candidate: &str, hash: &PasswordHash) -> bool {
        let hasher = *self;
        let candidate = candidate.to_owned();
        let hash = hash.clone();
        match tokio::task::spawn_blocking(move || hasher.verify(&candidate, &hash)).await {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, "Password comparison task failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(WorkFactor::new(4).unwrap())
    }

    #[test]
    fn work_factor_bounds() {
        assert!(WorkFactor::new(3).is_err());
        assert!(WorkFactor::new(4).is_ok());
        assert!(WorkFactor::new(20).is_ok());
        assert!(WorkFactor::new(21).is_err());
    }

    #[test]
    fn work_factor_deserialization_validates() {
        assert!(serde_json::from_str::<WorkFactor>("12").is_ok());
        assert!(serde_json::from_str::<WorkFactor>("2").is_err());
    }

    #[test]
    fn hash_then_verify() {
        let hash = hasher().hash("Password123!").unwrap();
        assert!(hasher().verify("Password123!", &hash));
        assert!(!hasher().verify("Password124!", &hash));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        assert!(!hasher().verify("anything", &PasswordHash::new("not-a-bcrypt-hash")));
    }

    #[tokio::test]
    async fn blocking_variants_agree_with_sync_ones() {
        let hash = hasher().hash_blocking("Password123!").await.unwrap();
        assert!(hasher().verify("Password123!", &hash));
        assert!(hasher().verify_blocking("Password123!", &hash).await);
        assert!(!hasher().verify_blocking("Password124!", &hash).await);
    }

    #[test]
    fn hash_is_redacted() {
        let hash = hasher().hash("Password123!").unwrap();
        assert!(!format!("{:?}", hash).contains("$2"));
    }
}
