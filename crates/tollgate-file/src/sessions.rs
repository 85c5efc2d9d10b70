//! File-backed session store.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, instrument};

use tollgate_core::traits::SessionStore;
use tollgate_core::types::{PublicSession, Session, SessionId, SessionRef, UserId};
use tollgate_core::Result;

use crate::store::FileStore;

/// Stores one JSON record per session under `sessions/`.
///
/// Records are never deleted; invalidation rewrites `valid` to false.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    store: FileStore,
}

impl FileSessionStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            store: FileStore::new(root),
        }
    }

    /// Access the underlying file store.
    pub fn store(&self) -> &FileStore {
        &self.store
    }
}

fn load(store: &FileStore, id: &SessionId) -> Result<Option<Session>> {
    store.read_record(&store.session_path(id))
}

fn all(store: &FileStore) -> Result<Vec<Session>> {
    store.scan(&store.sessions_dir())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    #[instrument(skip(self))]
    async fn create(&self, user_id: &UserId, user_agent: Option<&str>) -> Result<Session> {
        let session = Session::new(*user_id, user_agent);
        let record = session.clone();
        self.store
            .with_lock(move |store| store.write_record(&store.session_path(&record.id), &record))
            .await?;
        debug!(session_id = %session.id, "Created session");
        Ok(session)
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<SessionRef>> {
        let id = *id;
        let session = self.store.blocking(move |store| load(store, &id)).await?;
        Ok(session.as_ref().map(Session::to_ref))
    }

    async fn find_valid_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<PublicSession>> {
        let mut sessions: Vec<Session> = self
            .store
            .blocking(all)
            .await?
            .into_iter()
            .filter(|s| s.valid && &s.user_id == user_id)
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions.iter().take(limit).map(Session::to_public).collect())
    }

    #[instrument(skip(self))]
    async fn invalidate(&self, id: &SessionId) -> Result<()> {
        let id = *id;
        self.store
            .with_lock(move |store| {
                let Some(mut session) = load(store, &id)? else {
                    return Ok(());
                };
                if session.invalidate() {
                    store.write_record(&store.session_path(&id), &session)?;
                    debug!(session_id = %id, "Invalidated session");
                }
                Ok(())
            })
            .await
    }

    #[instrument(skip(self))]
    async fn invalidate_all_for_user(&self, user_id: &UserId) -> Result<usize> {
        let user_id = *user_id;
        self.store
            .with_lock(move |store| {
                let mut count = 0;
                for mut session in all(store)? {
                    if session.user_id != user_id || !session.invalidate() {
                        continue;
                    }
                    store.write_record(&store.session_path(&session.id), &session)?;
                    count += 1;
                }
                debug!(%user_id, count, "Invalidated sessions");
                Ok(count)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tollgate_core::error::StorageError;
    use tollgate_core::Error;

    #[tokio::test]
    async fn reads_legacy_owner_field() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        let id = SessionId::generate();
        let user = UserId::generate();

        let legacy = serde_json::json!({
            "id": id.to_string(),
            "user": user.to_string(),
            "valid": true,
            "userAgent": "old-client",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
        });
        std::fs::create_dir_all(store.store().sessions_dir()).unwrap();
        std::fs::write(store.store().session_path(&id), legacy.to_string()).unwrap();

        let found = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.user_id, user);
        assert!(found.valid);

        // Rewrites use the canonical field name.
        store.invalidate(&id).await.unwrap();
        let raw = std::fs::read_to_string(store.store().session_path(&id)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["userId"], user.to_string());
        assert!(json.get("user").is_none());
        assert_eq!(json["valid"], false);
    }

    #[tokio::test]
    async fn corrupt_session_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        let id = SessionId::generate();
        std::fs::create_dir_all(store.store().sessions_dir()).unwrap();
        std::fs::write(store.store().session_path(&id), "{").unwrap();

        assert!(matches!(
            store.find_by_id(&id).await,
            Err(Error::Storage(StorageError::Corrupt { .. }))
        ));
    }

    #[tokio::test]
    async fn invalidate_all_touches_only_owner() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        let jane = UserId::generate();
        let john = UserId::generate();

        store.create(&jane, None).await.unwrap();
        store.create(&jane, Some("phone")).await.unwrap();
        let johns = store.create(&john, None).await.unwrap();

        assert_eq!(store.invalidate_all_for_user(&jane).await.unwrap(), 2);
        assert_eq!(store.invalidate_all_for_user(&jane).await.unwrap(), 0);
        assert!(store.find_by_id(&johns.id).await.unwrap().unwrap().valid);
        assert_eq!(store.find_valid_by_user(&john, 50).await.unwrap().len(), 1);
    }
}
