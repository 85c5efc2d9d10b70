//! The session protocol engine.
//!
//! Issues access/refresh token pairs bound to a server-side session, verifies
//! them on every request, renews expired access tokens from a refresh token,
//! and enforces revocation two ways:
//!
//! - **Session revocation**: an invalidated session stops all renewals.
//! - **Password version**: every token carries the password version it was
//!   issued under; changing the password makes every older token stale.
//!
//! ## Per-request states
//!
//! ```text
//! no tokens ───────────────────────────────► Unauthenticated
//! access valid, pv current ────────────────► Fresh
//! access bad/expired/stale ─┬─ no refresh ─► Rejected
//!                           └─ refresh ok ─► Renewed (new access token only)
//!                              refresh bad ► Rejected
//! ```
//!
//! Token and session failures never escape as errors; they degrade the
//! request to "no identity".

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::TimeDelta;
use tracing::{debug, error, info, instrument, warn};

use crate::Result;
use crate::authenticator::Authenticator;
use crate::codec::{TokenClaims, TokenCodec, Verification};
use crate::config::AuthConfig;
use crate::credentials::Credentials;
use crate::error::{AuthError, ConfigError, Error, StorageError};
use crate::tokens::{AccessToken, PresentedTokens, RefreshToken};
use crate::traits::{CredentialStore, SessionStore};
use crate::types::{NewUser, PublicSession, PublicUser, Session, SessionId, UserId};

/// The identity attached to an authenticated request.
///
/// Carries only the public projection, never raw token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: PublicUser,
}

impl Identity {
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }
}

/// Why a request that presented tokens ended up without an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Signature, issuer, audience, or structure check failed.
    TokenInvalid,
    /// Token is past its expiry.
    TokenExpired,
    /// Token was issued under an older password version.
    PasswordChanged,
    /// The token's session does not exist.
    SessionNotFound,
    /// The token's session was invalidated.
    SessionRevoked,
    /// The user no longer exists.
    UserNotFound,
    /// A store call failed or timed out.
    StoreFailed,
    /// Minting the replacement access token failed.
    SigningFailed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::TokenInvalid => "verify_failed",
            RejectReason::TokenExpired => "token_expired",
            RejectReason::PasswordChanged => "pv_mismatch",
            RejectReason::SessionNotFound => "session_not_found",
            RejectReason::SessionRevoked => "session_invalid",
            RejectReason::UserNotFound => "user_not_found",
            RejectReason::StoreFailed => "store_failed",
            RejectReason::SigningFailed => "signing_failed",
        };
        write!(f, "{}", s)
    }
}

impl From<RejectReason> for Error {
    fn from(reason: RejectReason) -> Self {
        use crate::error::TokenError;
        match reason {
            RejectReason::TokenInvalid => TokenError::Invalid.into(),
            RejectReason::TokenExpired => TokenError::Expired.into(),
            RejectReason::PasswordChanged => AuthError::PasswordChanged.into(),
            RejectReason::SessionNotFound | RejectReason::SessionRevoked => {
                AuthError::SessionRevoked.into()
            }
            _ => AuthError::Unauthenticated.into(),
        }
    }
}

/// Result of authenticating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No tokens were presented.
    Unauthenticated,
    /// The access token was valid and current.
    Fresh(Identity),
    /// The access token was replaced using the refresh token.
    Renewed {
        identity: Identity,
        access_token: AccessToken,
    },
    /// Tokens were presented but none could establish an identity.
    Rejected(RejectReason),
}

impl AuthOutcome {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthOutcome::Fresh(identity) | AuthOutcome::Renewed { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn into_identity(self) -> Option<Identity> {
        match self {
            AuthOutcome::Fresh(identity) | AuthOutcome::Renewed { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// The replacement access token, if one was minted.
    pub fn renewed_token(&self) -> Option<&AccessToken> {
        match self {
            AuthOutcome::Renewed { access_token, .. } => Some(access_token),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }
}

/// Output of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub user: PublicUser,
    pub session: Session,
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

/// Drives login, per-request authentication, renewal, and logout.
///
/// Holds the shared, immutable configuration and codec plus the two stores.
/// The engine keeps no per-request state and takes no locks; concurrent
/// requests rely on the stores' single-record atomicity.
pub struct SessionEngine<C, S> {
    config: Arc<AuthConfig>,
    codec: Arc<TokenCodec>,
    credentials: C,
    sessions: S,
    access_ttl: TimeDelta,
    refresh_ttl: TimeDelta,
}

impl<C, S> SessionEngine<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    /// Validate configuration and parse key material.
    ///
    /// Any error here is fatal: bad keys or settings must stop start-up.
    pub fn new(
        config: Arc<AuthConfig>,
        credentials: C,
        sessions: S,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let codec = Arc::new(TokenCodec::new(&config)?);
        Self::with_codec(config, codec, credentials, sessions)
    }

    /// Build an engine around an already-constructed codec.
    pub fn with_codec(
        config: Arc<AuthConfig>,
        codec: Arc<TokenCodec>,
        credentials: C,
        sessions: S,
    ) -> std::result::Result<Self, ConfigError> {
        let ttl = |field: &str, secs: u64| {
            i64::try_from(secs)
                .ok()
                .and_then(TimeDelta::try_seconds)
                .ok_or_else(|| ConfigError::Invalid {
                    field: field.to_string(),
                    reason: "out of range".to_string(),
                })
        };
        let access_ttl = ttl("access_token_ttl_secs", config.access_token_ttl_secs)?;
        let refresh_ttl = ttl("refresh_token_ttl_secs", config.refresh_token_ttl_secs)?;

        Ok(Self {
            config,
            codec,
            credentials,
            sessions,
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Run a store call under the configured time budget.
    async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output> {
        match self.config.store_timeout() {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                StorageError::Timeout {
                    duration_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                }
                .into()
            }),
            None => Ok(fut.await),
        }
    }

    /// Register a new user.
    #[instrument(skip(self))]
    pub async fn register(&self, new_user: NewUser) -> Result<PublicUser> {
        let user = self.bounded(self.credentials.create(new_user)).await??;
        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    /// Authenticate credentials, open a session, and issue a token pair.
    ///
    /// Both tokens carry the same claims `{sub, pv, session}`; only their TTL
    /// differs.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email or a
    /// wrong password, without saying which.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(
        &self,
        credentials: &Credentials,
        user_agent: Option<&str>,
    ) -> Result<LoginOutput> {
        let outcome = self
            .bounded(Authenticator::new(&self.credentials).authenticate(credentials))
            .await?;
        let (user, password_version) = outcome.into_result()?;

        let session = self
            .bounded(self.sessions.create(&user.id, user_agent))
            .await??;

        let claims = TokenClaims {
            sub: user.id,
            pv: password_version,
            session: session.id,
        };
        let access_token = AccessToken::new(self.codec.issue(&claims, self.access_ttl)?);
        let refresh_token = RefreshToken::new(self.codec.issue(&claims, self.refresh_ttl)?);

        info!(user_id = %user.id, session_id = %session.id, "Session established");

        Ok(LoginOutput {
            user,
            session,
            access_token,
            refresh_token,
        })
    }

    /// Decide the identity of one request from the tokens it presented.
    ///
    /// Never fails. Every token or store problem degrades to
    /// [`AuthOutcome::Rejected`], which downstream treats as unauthenticated.
    #[instrument(skip_all)]
    pub async fn authenticate_request(&self, presented: &PresentedTokens) -> AuthOutcome {
        if presented.is_empty() {
            return AuthOutcome::Unauthenticated;
        }

        let mut reason = RejectReason::TokenInvalid;

        if let Some(access) = &presented.access {
            match self.check_access(access).await {
                Ok(identity) => return AuthOutcome::Fresh(identity),
                Err(r) => {
                    debug!(reason = %r, "Access token not usable");
                    reason = r;
                }
            }
        }

        let Some(refresh) = &presented.refresh else {
            warn!(%reason, "access token rejected and no refresh token presented");
            return AuthOutcome::Rejected(reason);
        };

        match self.renew(refresh).await {
            Ok((identity, access_token)) => AuthOutcome::Renewed {
                identity,
                access_token,
            },
            Err(reason) => AuthOutcome::Rejected(reason),
        }
    }

    async fn check_access(&self, token: &AccessToken) -> std::result::Result<Identity, RejectReason> {
        let claims = match self.codec.verify(token.as_str()) {
            Verification::Valid(claims) => claims,
            Verification::Expired => return Err(RejectReason::TokenExpired),
            Verification::Invalid => return Err(RejectReason::TokenInvalid),
        };

        let current = match self.bounded(self.credentials.find_versioned_by_id(&claims.sub)).await {
            Ok(Ok(Some(current))) => current,
            Ok(Ok(None)) => return Err(RejectReason::UserNotFound),
            Ok(Err(e)) | Err(e) => {
                warn!(error = %e, "Password version lookup failed");
                return Err(RejectReason::StoreFailed);
            }
        };

        if current.password_version != claims.pv {
            return Err(RejectReason::PasswordChanged);
        }

        Ok(Identity { user: current.user })
    }

    /// Mint a new access token from a refresh token.
    ///
    /// The refresh token itself is never re-minted, so it stays usable until
    /// its own expiry or until its session is invalidated.
    async fn renew(
        &self,
        refresh: &RefreshToken,
    ) -> std::result::Result<(Identity, AccessToken), RejectReason> {
        let claims = match self.codec.verify(refresh.as_str()) {
            Verification::Valid(claims) => claims,
            outcome => {
                let reason = if outcome.is_expired() {
                    RejectReason::TokenExpired
                } else {
                    RejectReason::TokenInvalid
                };
                warn!(%reason, "refresh token verification failed");
                return Err(reason);
            }
        };

        let session_id = claims.session;
        let session = match self.bounded(self.sessions.find_by_id(&session_id)).await {
            Ok(Ok(Some(session))) => session,
            Ok(Ok(None)) => {
                warn!(reason = %RejectReason::SessionNotFound, %session_id, "session not found");
                return Err(RejectReason::SessionNotFound);
            }
            Ok(Err(e)) | Err(e) => {
                warn!(reason = %RejectReason::StoreFailed, %session_id, error = %e, "session lookup failed");
                return Err(RejectReason::StoreFailed);
            }
        };

        if !session.valid {
            warn!(reason = %RejectReason::SessionRevoked, %session_id, "session marked invalid");
            return Err(RejectReason::SessionRevoked);
        }

        // The session, not the token, says who the user is.
        let user_id = session.user_id;
        let current = match self.bounded(self.credentials.find_versioned_by_id(&user_id)).await {
            Ok(Ok(Some(current))) => current,
            Ok(Ok(None)) => {
                warn!(reason = %RejectReason::UserNotFound, %user_id, %session_id, "user not found");
                return Err(RejectReason::UserNotFound);
            }
            Ok(Err(e)) | Err(e) => {
                warn!(reason = %RejectReason::StoreFailed, %user_id, error = %e, "user lookup failed");
                return Err(RejectReason::StoreFailed);
            }
        };

        if claims.pv != current.password_version {
            warn!(
                reason = %RejectReason::PasswordChanged,
                %user_id,
                %session_id,
                refresh_pv = claims.pv,
                current_pv = current.password_version,
                "password version mismatch; denying reissue"
            );
            return Err(RejectReason::PasswordChanged);
        }

        let fresh = TokenClaims {
            sub: user_id,
            pv: current.password_version,
            session: session_id,
        };
        let token = self.codec.issue(&fresh, self.access_ttl).map_err(|e| {
            error!(reason = %RejectReason::SigningFailed, error = %e, "could not sign access token");
            RejectReason::SigningFailed
        })?;

        info!(event = "access_reissued", %user_id, %session_id, "issued new access token from refresh");

        Ok((Identity { user: current.user }, AccessToken::new(token)))
    }

    /// Invalidate the session named by the presented tokens.
    ///
    /// Prefers the refresh token's session claim, then the access token's.
    /// Safe with garbage or missing tokens; returns the session that was
    /// targeted, if any.
    #[instrument(skip_all)]
    pub async fn logout(&self, presented: &PresentedTokens) -> Option<SessionId> {
        let from_refresh = presented
            .refresh
            .as_ref()
            .and_then(|t| self.codec.verify(t.as_str()).into_claims());
        let from_access = || {
            presented
                .access
                .as_ref()
                .and_then(|t| self.codec.verify(t.as_str()).into_claims())
        };

        let session_id = from_refresh.or_else(from_access).map(|c| c.session)?;

        match self.bounded(self.sessions.invalidate(&session_id)).await {
            Ok(Ok(())) => info!(%session_id, "Session invalidated"),
            Ok(Err(e)) | Err(e) => warn!(%session_id, error = %e, "Failed to invalidate session"),
        }

        Some(session_id)
    }

    /// Invalidate every session of a user ("log out everywhere").
    #[instrument(skip(self))]
    pub async fn revoke_all(&self, user_id: &UserId) -> Result<usize> {
        let count = self
            .bounded(self.sessions.invalidate_all_for_user(user_id))
            .await??;
        info!(%user_id, count, "Invalidated all sessions");
        Ok(count)
    }

    /// A user's valid sessions, newest first, capped at the configured page size.
    #[instrument(skip(self))]
    pub async fn list_sessions(&self, user_id: &UserId) -> Result<Vec<PublicSession>> {
        self.bounded(
            self.sessions
                .find_valid_by_user(user_id, self.config.session_page_size),
        )
        .await?
    }

    /// Change a user's password after checking the current one.
    ///
    /// Bumps the password version, which makes every previously issued
    /// access and refresh token stale. Sessions stay valid; clients log in
    /// again to get tokens under the new version.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<u64> {
        let user = self
            .bounded(self.credentials.find_public_by_id(user_id))
            .await??
            .ok_or(AuthError::InvalidCredentials)?;

        let credentials = Credentials::new(user.email.as_str(), current_password);
        let outcome = self
            .bounded(Authenticator::new(&self.credentials).authenticate(&credentials))
            .await?;
        outcome.into_result()?;

        let version = self
            .bounded(self.credentials.change_password(user_id, new_password))
            .await??;
        info!(%user_id, password_version = version, "Password changed");
        Ok(version)
    }
}

impl<C, S> fmt::Debug for SessionEngine<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngine")
            .field("codec", &self.codec)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
