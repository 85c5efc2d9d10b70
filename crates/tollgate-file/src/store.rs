//! On-disk layout and record IO shared by the file-backed stores.
//!
//! ```text
//! <root>/
//!   store.lock
//!   users/<user-id>.json
//!   sessions/<session-id>.json
//! ```
//!
//! Writers hold an exclusive advisory lock on `store.lock` for the whole
//! read-check-write sequence. Records are written to a temp file and renamed
//! into place, so a reader never sees a partial record.
//!
//! Record IO runs on the blocking pool and the lock is polled, so a store
//! call always yields and can be cancelled by its caller's deadline.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{trace, warn};

use tollgate_core::Result;
use tollgate_core::error::StorageError;
use tollgate_core::types::{SessionId, UserId};

/// Pause between attempts to take a contended store lock.
const LOCK_RETRY: Duration = Duration::from_millis(10);

fn map_io(err: std::io::Error) -> StorageError {
    StorageError::Io {
        message: err.to_string(),
    }
}

fn corrupt(path: &Path, reason: impl ToString) -> StorageError {
    StorageError::Corrupt {
        record: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Filesystem root holding user and session records.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new file store at the given root directory.
    ///
    /// Directories are created lazily on first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    pub(crate) fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join("store.lock")
    }

    pub(crate) fn user_path(&self, id: &UserId) -> PathBuf {
        self.users_dir().join(format!("{}.json", id))
    }

    pub(crate) fn session_path(&self, id: &SessionId) -> PathBuf {
        self.sessions_dir().join(format!("{}.json", id))
    }

    fn open_lock(&self) -> Result<File> {
        fs::create_dir_all(&self.root).map_err(map_io)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(map_io)?;
        Ok(lock_file)
    }

    /// Run blocking record IO on the blocking pool.
    pub(crate) async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&FileStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StorageError::Io {
                message: e.to_string(),
            })?
    }

    /// Run `f` on the blocking pool while holding the store-wide write lock.
    ///
    /// A contended lock is retried after a short sleep rather than waited on.
    /// Dropping the future while it waits releases the lock file untouched.
    pub(crate) async fn with_lock<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&FileStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let lock_file = self.blocking(|store| store.open_lock()).await?;

        loop {
            match lock_file.try_lock_exclusive() {
                Ok(()) => break,
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    trace!(path = %self.lock_path().display(), "Store lock busy");
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(e) => return Err(map_io(e).into()),
            }
        }

        self.blocking(move |store| {
            let result = f(store);
            FileExt::unlock(&lock_file).map_err(map_io)?;
            result
        })
        .await
    }

    /// Write a record atomically via temp file and rename.
    pub(crate) fn write_record<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        let content = serde_json::to_vec_pretty(record).map_err(|e| corrupt(path, e))?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = File::create(&temp_path).map_err(map_io)?;
        file.write_all(&content).map_err(map_io)?;
        file.sync_data().map_err(map_io)?;
        fs::rename(&temp_path, path).map_err(map_io)?;

        trace!(path = %path.display(), "Wrote record");
        Ok(())
    }

    /// Read one record. A missing file is `None`; an undecodable one is an error.
    pub(crate) fn read_record<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_io(e).into()),
        };

        let record = serde_json::from_slice(&content).map_err(|e| corrupt(path, e))?;
        Ok(Some(record))
    }

    /// Read every record in a directory.
    ///
    /// Undecodable records are logged and skipped so one bad file cannot hide
    /// the rest.
    pub(crate) fn scan<T: DeserializeOwned>(&self, dir: &Path) -> Result<Vec<T>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(map_io(e).into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry.map_err(map_io)?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match self.read_record(&path) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable record"),
            }
        }

        Ok(records)
    }
}
