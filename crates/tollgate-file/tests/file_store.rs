//! Session engine over the file backend.

use std::fs::File;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tempfile::TempDir;
use tollgate_core::error::StorageError;
use tollgate_core::{
    AuthConfig, AuthOutcome, Credentials, Error, NewUser, PasswordHasher, PresentedTokens,
    RejectReason, SessionEngine, WorkFactor,
};
use tollgate_file::{FileCredentialStore, FileSessionStore};

const PRIVATE_KEY: &str = include_str!("../../tollgate-core/testdata/private.pem");
const PUBLIC_KEY: &str = include_str!("../../tollgate-core/testdata/public.pem");

type Engine = SessionEngine<FileCredentialStore, FileSessionStore>;

fn engine(dir: &TempDir) -> Engine {
    engine_with_timeout(dir, None)
}

fn engine_with_timeout(dir: &TempDir, store_timeout_ms: Option<u64>) -> Engine {
    let mut cfg = AuthConfig::new(PRIVATE_KEY, PUBLIC_KEY, "tollgate", "tollgate-clients");
    cfg.work_factor = WorkFactor::new(4).unwrap();
    cfg.store_timeout_ms = store_timeout_ms;
    let hasher = PasswordHasher::new(cfg.work_factor);
    SessionEngine::new(
        Arc::new(cfg),
        FileCredentialStore::new(dir.path(), hasher),
        FileSessionStore::new(dir.path()),
    )
    .unwrap()
}

#[tokio::test]
async fn state_survives_restart() {
    let dir = TempDir::new().unwrap();

    let (user_id, refresh) = {
        let first = engine(&dir);
        let user = first
            .register(NewUser::new("jane", "jane@example.com", "Password123!").unwrap())
            .await
            .unwrap();
        let login = first
            .login(&Credentials::new("jane@example.com", "Password123!"), Some("cli"))
            .await
            .unwrap();
        (user.id, login.refresh_token)
    };

    let second = engine(&dir);
    let presented = PresentedTokens::new(None, Some(refresh.as_str()));
    let outcome = second.authenticate_request(&presented).await;
    assert_eq!(outcome.identity().unwrap().user.id, user_id);

    let sessions = second.list_sessions(&user_id).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].user_agent.as_deref(), Some("cli"));

    second.logout(&presented).await;
    assert_eq!(
        engine(&dir).authenticate_request(&presented).await,
        AuthOutcome::Rejected(RejectReason::SessionRevoked)
    );
}

#[tokio::test]
async fn password_change_is_durable() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    let user = engine
        .register(NewUser::new("jane", "jane@example.com", "Password123!").unwrap())
        .await
        .unwrap();
    let login = engine
        .login(&Credentials::new("jane@example.com", "Password123!"), None)
        .await
        .unwrap();

    engine
        .change_password(&user.id, "Password123!", "NewPassword456!")
        .await
        .unwrap();

    let presented = PresentedTokens::new(
        Some(login.access_token.as_str()),
        Some(login.refresh_token.as_str()),
    );
    assert_eq!(
        engine.authenticate_request(&presented).await,
        AuthOutcome::Rejected(RejectReason::PasswordChanged)
    );

    // Sessions stay valid after a password change.
    assert_eq!(engine.list_sessions(&user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn no_temp_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir);
    let user = engine
        .register(NewUser::new("jane", "jane@example.com", "Password123!").unwrap())
        .await
        .unwrap();
    engine
        .login(&Credentials::new("jane@example.com", "Password123!"), None)
        .await
        .unwrap();
    engine.revoke_all(&user.id).await.unwrap();

    for sub in ["users", "sessions"] {
        for entry in std::fs::read_dir(dir.path().join(sub)).unwrap() {
            let path = entry.unwrap().path();
            assert_eq!(path.extension().unwrap(), "json", "{}", path.display());
        }
    }
}

/// Hold the store-wide write lock from a separate handle.
fn hold_store_lock(dir: &TempDir) -> File {
    let holder = File::open(dir.path().join("store.lock")).unwrap();
    holder.lock_exclusive().unwrap();
    holder
}

#[tokio::test]
async fn held_store_lock_times_out_login() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with_timeout(&dir, Some(200));
    engine
        .register(NewUser::new("jane", "jane@example.com", "Password123!").unwrap())
        .await
        .unwrap();
    let credentials = Credentials::new("jane@example.com", "Password123!");

    let holder = hold_store_lock(&dir);
    let started = Instant::now();
    let result = engine.login(&credentials, None).await;
    let elapsed = started.elapsed();

    assert!(
        matches!(
            result,
            Err(Error::Storage(StorageError::Timeout { duration_ms: 200 }))
        ),
        "{:?}",
        result.map(|login| login.session.id)
    );
    assert!(elapsed < Duration::from_secs(1), "took {:?}", elapsed);

    FileExt::unlock(&holder).unwrap();
    engine.login(&credentials, None).await.unwrap();
}

#[tokio::test]
async fn held_store_lock_does_not_hang_logout() {
    let dir = TempDir::new().unwrap();
    let engine = engine_with_timeout(&dir, Some(200));
    engine
        .register(NewUser::new("jane", "jane@example.com", "Password123!").unwrap())
        .await
        .unwrap();
    let login = engine
        .login(&Credentials::new("jane@example.com", "Password123!"), None)
        .await
        .unwrap();
    let presented = PresentedTokens::new(None, Some(login.refresh_token.as_str()));

    let holder = hold_store_lock(&dir);
    let started = Instant::now();
    engine.logout(&presented).await;
    assert!(started.elapsed() < Duration::from_secs(1));

    // The timed-out invalidation never ran, so the session is still live.
    FileExt::unlock(&holder).unwrap();
    assert!(engine.authenticate_request(&presented).await.is_authenticated());
}
