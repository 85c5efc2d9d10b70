//! Credential store trait.

use async_trait::async_trait;

use crate::Result;
use crate::hashing::PasswordHash;
use crate::types::{Email, NewUser, PublicUser, UserId, UserSecrets, VersionedUser};

/// Persists user identity, password hash, and password version.
///
/// The store exclusively owns the hash. Everything else sees a
/// [`PublicUser`], or a [`VersionedUser`] for internal decisions.
///
/// Implementations must persist the hash and its version in one atomic
/// write: a reader never observes a bumped version with a stale hash, or the
/// reverse.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Hash the password, store version 1, and return the public projection.
    ///
    /// # Errors
    ///
    /// Returns a conflict error if the username or email is taken.
    async fn create(&self, new_user: NewUser) -> Result<PublicUser>;

    /// Look up the public projection of a user.
    async fn find_public_by_id(&self, id: &UserId) -> Result<Option<PublicUser>>;

    /// Look up a user together with the current password version.
    async fn find_versioned_by_id(&self, id: &UserId) -> Result<Option<VersionedUser>>;

    /// The only accessor that returns the hash. Never serialize the result.
    async fn find_with_secrets_by_email(&self, email: &Email) -> Result<Option<UserSecrets>>;

    /// Re-hash and bump the password version in one write.
    ///
    /// Returns the new version. The new password must satisfy the policy.
    async fn change_password(&self, id: &UserId, new_password: &str) -> Result<u64>;

    /// Compare a candidate against a stored hash. Never fails; errors are a mismatch.
    ///
    /// Implementations should keep the hashing off the async worker so a
    /// caller's deadline can fire.
    async fn compare_password(&self, hash: &PasswordHash, candidate: &str) -> bool;
}
