//! tollgate-core - Session authentication with revocable token pairs.
//!
//! Login yields a short-lived access token and a long-lived refresh token,
//! both bound to a server-side session and to the user's password version.
//! The [`SessionEngine`] verifies them per request, renews expired access
//! tokens, and enforces revocation by session invalidation or password change.
//!
//! Storage is pluggable through [`CredentialStore`] and [`SessionStore`]; an
//! in-memory backend lives in [`memory`].

pub mod authenticator;
pub mod codec;
pub mod config;
pub mod cookie;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod memory;
pub mod service;
pub mod tokens;
pub mod traits;
pub mod types;

pub use authenticator::{AuthFailure, AuthResult, Authenticator};
pub use codec::{TokenClaims, TokenCodec, Verification};
pub use config::{AuthConfig, CookiePolicy, SameSite};
pub use cookie::{CookieJar, CookieNames};
pub use credentials::Credentials;
pub use engine::{AuthOutcome, Identity, LoginOutput, RejectReason, SessionEngine};
pub use error::Error;
pub use hashing::{PasswordHash, PasswordHasher, WorkFactor};
pub use service::{AuthRequest, AuthResponse, AuthService, RequestContext};
pub use tokens::{AccessToken, PresentedTokens, RefreshToken};
pub use traits::{CredentialStore, SessionStore};
pub use types::{
    Email, NewUser, PublicSession, PublicUser, Session, SessionId, SessionRef, UserId, UserRecord,
    UserSecrets, Username, VersionedUser,
};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
