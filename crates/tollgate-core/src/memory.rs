//! In-memory store backend.
//!
//! Useful for tests and for embedding where durability is not needed. Each
//! operation takes the lock once, so single-record reads and writes are
//! atomic just as the store contracts require.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::Result;
use crate::error::{ConflictError, StorageError};
use crate::hashing::{PasswordHash, PasswordHasher};
use crate::traits::{CredentialStore, SessionStore};
use crate::types::{
    Email, NewUser, PublicSession, PublicUser, Session, SessionId, SessionRef, UserId, UserRecord,
    UserSecrets, VersionedUser, validate_password,
};

/// Credential store holding user records in a map.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    hasher: PasswordHasher,
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl MemoryCredentialStore {
    pub fn new(hasher: PasswordHasher) -> Self {
        Self {
            hasher,
            users: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, new_user: NewUser) -> Result<PublicUser> {
        let password_hash = self.hasher.hash_blocking(new_user.password()).await?;
        let mut users = self.users.write().await;

        if users.values().any(|u| u.username == new_user.username) {
            return Err(ConflictError::Username(new_user.username.to_string()).into());
        }
        if users.values().any(|u| u.email == new_user.email) {
            return Err(ConflictError::Email(new_user.email.to_string()).into());
        }

        let record = UserRecord::new(new_user.username, new_user.email, password_hash);
        let public = record.to_public();
        users.insert(record.id, record);

        debug!(user_id = %public.id, "Created user");
        Ok(public)
    }

    async fn find_public_by_id(&self, id: &UserId) -> Result<Option<PublicUser>> {
        Ok(self.users.read().await.get(id).map(UserRecord::to_public))
    }

    async fn find_versioned_by_id(&self, id: &UserId) -> Result<Option<VersionedUser>> {
        Ok(self.users.read().await.get(id).map(UserRecord::to_versioned))
    }

    async fn find_with_secrets_by_email(&self, email: &Email) -> Result<Option<UserSecrets>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .map(UserRecord::to_secrets))
    }

    async fn change_password(&self, id: &UserId, new_password: &str) -> Result<u64> {
        validate_password(new_password)?;
        let password_hash = self.hasher.hash_blocking(new_password).await?;

        let mut users = self.users.write().await;
        let record = users.get_mut(id).ok_or_else(|| StorageError::NotFound {
            kind: "user",
            id: id.to_string(),
        })?;

        let version = record.set_password_hash(password_hash);
        debug!(user_id = %id, password_version = version, "Changed password");
        Ok(version)
    }

    async fn compare_password(&self, hash: &PasswordHash, candidate: &str) -> bool {
        self.hasher.verify_blocking(candidate, hash).await
    }
}

/// Session store holding session records in a map.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: &UserId, user_agent: Option<&str>) -> Result<Session> {
        let session = Session::new(*user_id, user_agent);
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<SessionRef>> {
        Ok(self.sessions.read().await.get(id).map(Session::to_ref))
    }

    async fn find_valid_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<PublicSession>> {
        let sessions = self.sessions.read().await;
        let mut found: Vec<&Session> = sessions
            .values()
            .filter(|s| s.valid && &s.user_id == user_id)
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found.into_iter().take(limit).map(Session::to_public).collect())
    }

    async fn invalidate(&self, id: &SessionId) -> Result<()> {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.invalidate();
        }
        Ok(())
    }

    async fn invalidate_all_for_user(&self, user_id: &UserId) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let mut count = 0;
        for session in sessions.values_mut().filter(|s| &s.user_id == user_id) {
            if session.invalidate() {
                count += 1;
            }
        }
        Ok(count)
    }
}
