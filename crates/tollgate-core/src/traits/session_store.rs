//! Session store trait.

use async_trait::async_trait;

use crate::Result;
use crate::types::{PublicSession, Session, SessionId, SessionRef, UserId};

/// Persists session records.
///
/// No operation deletes a row or flips `valid` back to true. Correctness of
/// revocation relies on single-record reads and writes being atomic.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new valid session and return the full record.
    async fn create(&self, user_id: &UserId, user_agent: Option<&str>) -> Result<Session>;

    /// Look up the minimal projection needed on the renewal path.
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<SessionRef>>;

    /// A user's valid sessions, newest first, at most `limit`.
    async fn find_valid_by_user(&self, user_id: &UserId, limit: usize)
    -> Result<Vec<PublicSession>>;

    /// Set `valid = false`. Invalidating an invalid or unknown session is a no-op.
    async fn invalidate(&self, id: &SessionId) -> Result<()>;

    /// Invalidate every valid session of a user. Returns how many changed.
    async fn invalidate_all_for_user(&self, user_id: &UserId) -> Result<usize>;
}
