//! File-backed credential store.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, instrument};

use tollgate_core::error::{ConflictError, StorageError};
use tollgate_core::hashing::{PasswordHash, PasswordHasher};
use tollgate_core::traits::CredentialStore;
use tollgate_core::types::{
    Email, NewUser, PublicUser, UserId, UserRecord, UserSecrets, VersionedUser, validate_password,
};
use tollgate_core::Result;

use crate::store::FileStore;

/// Stores one JSON record per user under `users/`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    store: FileStore,
    hasher: PasswordHasher,
}

impl FileCredentialStore {
    pub fn new(root: impl AsRef<Path>, hasher: PasswordHasher) -> Self {
        Self {
            store: FileStore::new(root),
            hasher,
        }
    }

    /// Access the underlying file store.
    pub fn store(&self) -> &FileStore {
        &self.store
    }
}

fn load(store: &FileStore, id: &UserId) -> Result<Option<UserRecord>> {
    store.read_record(&store.user_path(id))
}

fn all(store: &FileStore) -> Result<Vec<UserRecord>> {
    store.scan(&store.users_dir())
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    async fn create(&self, new_user: NewUser) -> Result<PublicUser> {
        let password_hash = self.hasher.hash_blocking(new_user.password()).await?;

        let record = self
            .store
            .with_lock(move |store| {
                let existing = all(store)?;
                if existing.iter().any(|u| u.username == new_user.username) {
                    return Err(ConflictError::Username(new_user.username.to_string()).into());
                }
                if existing.iter().any(|u| u.email == new_user.email) {
                    return Err(ConflictError::Email(new_user.email.to_string()).into());
                }

                let record = UserRecord::new(
                    new_user.username.clone(),
                    new_user.email.clone(),
                    password_hash,
                );
                store.write_record(&store.user_path(&record.id), &record)?;
                Ok(record)
            })
            .await?;

        debug!(user_id = %record.id, "Created user");
        Ok(record.to_public())
    }

    async fn find_public_by_id(&self, id: &UserId) -> Result<Option<PublicUser>> {
        let id = *id;
        let record = self.store.blocking(move |store| load(store, &id)).await?;
        Ok(record.as_ref().map(UserRecord::to_public))
    }

    async fn find_versioned_by_id(&self, id: &UserId) -> Result<Option<VersionedUser>> {
        let id = *id;
        let record = self.store.blocking(move |store| load(store, &id)).await?;
        Ok(record.as_ref().map(UserRecord::to_versioned))
    }

    async fn find_with_secrets_by_email(&self, email: &Email) -> Result<Option<UserSecrets>> {
        let records = self.store.blocking(all).await?;
        Ok(records
            .iter()
            .find(|u| &u.email == email)
            .map(UserRecord::to_secrets))
    }

    #[instrument(skip(self, new_password))]
    async fn change_password(&self, id: &UserId, new_password: &str) -> Result<u64> {
        validate_password(new_password)?;
        let password_hash = self.hasher.hash_blocking(new_password).await?;

        let id = *id;
        let version = self
            .store
            .with_lock(move |store| {
                let mut record = load(store, &id)?.ok_or_else(|| StorageError::NotFound {
                    kind: "user",
                    id: id.to_string(),
                })?;
                let version = record.set_password_hash(password_hash);
                store.write_record(&store.user_path(&id), &record)?;
                Ok(version)
            })
            .await?;

        debug!(user_id = %id, password_version = version, "Changed password");
        Ok(version)
    }

    async fn compare_password(&self, hash: &PasswordHash, candidate: &str) -> bool {
        self.hasher.verify_blocking(candidate, hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tollgate_core::hashing::WorkFactor;
    use tollgate_core::Error;

    fn store(dir: &TempDir) -> FileCredentialStore {
        FileCredentialStore::new(dir.path(), PasswordHasher::new(WorkFactor::new(4).unwrap()))
    }

    fn jane() -> NewUser {
        NewUser::new("jane", "jane@example.com", "Password123!").unwrap()
    }

    #[tokio::test]
    async fn create_persists_camel_case_record() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let user = store.create(jane()).await.unwrap();

        let raw = std::fs::read_to_string(store.store().user_path(&user.id)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["passwordVersion"], 1);
        assert!(json["passwordHash"].as_str().unwrap().starts_with("$2"));
        assert_eq!(json["email"], "jane@example.com");
    }

    #[tokio::test]
    async fn duplicates_conflict() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.create(jane()).await.unwrap();

        let same_email = NewUser::new("janet", "JANE@example.com", "Password123!").unwrap();
        assert!(matches!(
            store.create(same_email).await,
            Err(Error::Conflict(ConflictError::Email(_)))
        ));
        let same_name = NewUser::new("jane", "j2@example.com", "Password123!").unwrap();
        assert!(matches!(
            store.create(same_name).await,
            Err(Error::Conflict(ConflictError::Username(_)))
        ));
    }

    #[tokio::test]
    async fn change_password_rewrites_hash_and_version_together() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let user = store.create(jane()).await.unwrap();

        assert_eq!(store.change_password(&user.id, "NewPassword456!").await.unwrap(), 2);

        let email = Email::new("jane@example.com").unwrap();
        let secrets = store.find_with_secrets_by_email(&email).await.unwrap().unwrap();
        assert_eq!(secrets.password_version, 2);
        assert!(store.compare_password(&secrets.password_hash, "NewPassword456!").await);

        let versioned = store.find_versioned_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(versioned.password_version, 2);
    }

    #[tokio::test]
    async fn weak_new_password_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let user = store.create(jane()).await.unwrap();

        assert!(matches!(
            store.change_password(&user.id, "weak").await,
            Err(Error::InvalidInput(_))
        ));
        let versioned = store.find_versioned_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(versioned.password_version, 1);
    }

    #[tokio::test]
    async fn unknown_ids_are_absent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let id = UserId::generate();
        assert!(store.find_public_by_id(&id).await.unwrap().is_none());
        assert!(matches!(
            store.change_password(&id, "NewPassword456!").await,
            Err(Error::Storage(StorageError::NotFound { .. }))
        ));
    }
}
