//! Password authentication against the credential store.

use std::fmt;

use tracing::{debug, error, info, instrument};

use crate::credentials::Credentials;
use crate::error::{AuthError, Error};
use crate::traits::CredentialStore;
use crate::types::PublicUser;

/// Why authentication failed.
///
/// Distinguished for logging only. Anything a remote caller sees collapses
/// both reasons into [`AuthError::InvalidCredentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    NoUser,
    BadPassword,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::NoUser => write!(f, "NO_USER"),
            AuthFailure::BadPassword => write!(f, "BAD_PASSWORD"),
        }
    }
}

/// Outcome of [`Authenticator::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    Ok {
        user: PublicUser,
        password_version: u64,
    },
    Failed(AuthFailure),
}

impl AuthResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, AuthResult::Ok { .. })
    }

    /// Collapse into a caller-facing result. Both failure reasons become the
    /// same generic error.
    pub fn into_result(self) -> Result<(PublicUser, u64), Error> {
        match self {
            AuthResult::Ok {
                user,
                password_version,
            } => Ok((user, password_version)),
            AuthResult::Failed(_) => Err(AuthError::InvalidCredentials.into()),
        }
    }
}

/// Verifies a plaintext password for a user identified by email.
pub struct Authenticator<'a, C: ?Sized> {
    store: &'a C,
}

impl<'a, C: CredentialStore + ?Sized> Authenticator<'a, C> {
    pub fn new(store: &'a C) -> Self {
        Self { store }
    }

    /// Normalize the email, look up secrets, and compare the password.
    ///
    /// Never fails: a malformed email or a store error counts as
    /// [`AuthFailure::NoUser`].
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn authenticate(&self, credentials: &Credentials) -> AuthResult {
        let outcome = self.check(credentials).await;
        match &outcome {
            AuthResult::Ok { user, .. } => {
                debug!(user_id = %user.id, "Password validation succeeded");
            }
            AuthResult::Failed(reason) => {
                info!(%reason, "Password validation failed");
            }
        }
        outcome
    }

    async fn check(&self, credentials: &Credentials) -> AuthResult {
        let Some(email) = credentials.lookup_email() else {
            return AuthResult::Failed(AuthFailure::NoUser);
        };

        let secrets = match self.store.find_with_secrets_by_email(&email).await {
            Ok(Some(secrets)) => secrets,
            Ok(None) => return AuthResult::Failed(AuthFailure::NoUser),
            Err(e) => {
                error!(error = %e, "Credential lookup failed");
                return AuthResult::Failed(AuthFailure::NoUser);
            }
        };

        if !self
            .store
            .compare_password(&secrets.password_hash, credentials.password())
            .await
        {
            return AuthResult::Failed(AuthFailure::BadPassword);
        }

        AuthResult::Ok {
            user: secrets.user,
            password_version: secrets.password_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::{PasswordHasher, WorkFactor};
    use crate::memory::MemoryCredentialStore;
    use crate::types::NewUser;

    async fn store_with_jane() -> (MemoryCredentialStore, PublicUser) {
        let store = MemoryCredentialStore::new(PasswordHasher::new(WorkFactor::new(4).unwrap()));
        let user = store
            .create(NewUser::new("jane", "jane@example.com", "Password123!").unwrap())
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn correct_password_authenticates() {
        let (store, jane) = store_with_jane().await;
        let result = Authenticator::new(&store)
            .authenticate(&Credentials::new(" Jane@Example.com ", "Password123!"))
            .await;

        match result {
            AuthResult::Ok {
                user,
                password_version,
            } => {
                assert_eq!(user.id, jane.id);
                assert_eq!(password_version, 1);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn wrong_password_is_bad_password() {
        let (store, _) = store_with_jane().await;
        let result = Authenticator::new(&store)
            .authenticate(&Credentials::new("jane@example.com", "Password124!"))
            .await;
        assert_eq!(result, AuthResult::Failed(AuthFailure::BadPassword));
    }

    #[tokio::test]
    async fn unknown_email_is_no_user() {
        let (store, _) = store_with_jane().await;
        let result = Authenticator::new(&store)
            .authenticate(&Credentials::new("john@example.com", "Password123!"))
            .await;
        assert_eq!(result, AuthResult::Failed(AuthFailure::NoUser));

        let result = Authenticator::new(&store)
            .authenticate(&Credentials::new("not-an-email", "Password123!"))
            .await;
        assert_eq!(result, AuthResult::Failed(AuthFailure::NoUser));
    }

    #[tokio::test]
    async fn failures_collapse_to_one_message() {
        let (store, _) = store_with_jane().await;
        let auth = Authenticator::new(&store);

        let no_user = auth
            .authenticate(&Credentials::new("john@example.com", "x"))
            .await
            .into_result()
            .unwrap_err()
            .to_string();
        let bad_password = auth
            .authenticate(&Credentials::new("jane@example.com", "x"))
            .await
            .into_result()
            .unwrap_err()
            .to_string();

        assert_eq!(no_user, bad_password);
        assert!(no_user.contains("invalid email or password"));
    }
}
