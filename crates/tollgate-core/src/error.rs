//! Error types for tollgate.
//!
//! This module provides a unified error type with explicit variants for
//! configuration, authentication, token, conflict, storage, and input
//! validation errors.
//!
//! Only [`ConflictError`] and [`AuthError::InvalidCredentials`] are meant to
//! cross the boundary to a remote caller. Token and session failures are
//! absorbed by the session engine and surface as "no identity".

use thiserror::Error;

/// The unified error type for tollgate operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (bad keys, bad work factor). Fatal at start-up.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Authentication errors (invalid credentials, revoked session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Token verification errors. Internal only.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Uniqueness conflicts (duplicate username or email).
    #[error("conflict: {0}")]
    Conflict(#[from] ConflictError),

    /// Backing store errors (IO, corrupt records, timeouts).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (email, username, password format).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

/// Configuration errors detected at process start.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The private key could not be parsed for signing.
    #[error("signing key is malformed: {reason}")]
    Signing { reason: String },

    /// The public key could not be parsed for verification.
    #[error("verification key is malformed: {reason}")]
    Verification { reason: String },

    /// The password hashing work factor is out of range.
    #[error("invalid work factor {value}: must be an integer in [4, 20]")]
    WorkFactor { value: u32 },

    /// Cookie policy is internally inconsistent.
    #[error("invalid cookie policy: {reason}")]
    CookiePolicy { reason: String },

    /// Any other invalid setting.
    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password did not match. Never says which.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The session has been invalidated.
    #[error("session revoked")]
    SessionRevoked,

    /// The password changed after the token was issued.
    #[error("password changed since token was issued")]
    PasswordChanged,

    /// No identity is attached to the request.
    #[error("authentication required")]
    Unauthenticated,
}

/// Token verification failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, issuer, audience, or malformed token.
    #[error("token invalid")]
    Invalid,

    /// Signature checks out but the token is past its expiry.
    #[error("token expired")]
    Expired,
}

/// Uniqueness conflicts on user creation.
#[derive(Debug, Error)]
pub enum ConflictError {
    /// The username is already registered.
    #[error("username '{0}' is already taken")]
    Username(String),

    /// The email is already registered.
    #[error("email '{0}' is already registered")]
    Email(String),
}

/// Backing store failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem or other IO failure.
    #[error("IO error: {message}")]
    Io { message: String },

    /// A persisted record could not be decoded.
    #[error("corrupt record '{record}': {reason}")]
    Corrupt { record: String, reason: String },

    /// A store call exceeded its time budget.
    #[error("store call timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// A record expected to exist was not found.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Password hashing failed.
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(StorageError::from(err))
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid email format.
    #[error("invalid email '{value}': {reason}")]
    Email { value: String, reason: String },

    /// Invalid username format.
    #[error("invalid username '{value}': {reason}")]
    Username { value: String, reason: String },

    /// Password does not satisfy the password policy.
    #[error("invalid password: {reason}")]
    Password { reason: String },

    /// Invalid identifier format.
    #[error("invalid id '{value}': {reason}")]
    Id { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

impl Error {
    /// Returns true if this error is safe to surface to a remote caller as is.
    pub fn is_client_visible(&self) -> bool {
        matches!(
            self,
            Error::Conflict(_)
                | Error::InvalidInput(_)
                | Error::Auth(AuthError::InvalidCredentials)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_message_is_generic() {
        let err: Error = AuthError::InvalidCredentials.into();
        assert_eq!(
            err.to_string(),
            "authentication error: invalid email or password"
        );
        assert!(err.is_client_visible());
    }

    #[test]
    fn token_errors_are_internal() {
        let err: Error = TokenError::Expired.into();
        assert!(!err.is_client_visible());
        let err: Error = AuthError::SessionRevoked.into();
        assert!(!err.is_client_visible());
    }

    #[test]
    fn work_factor_error_names_range() {
        let err = ConfigError::WorkFactor { value: 31 };
        assert!(err.to_string().contains("[4, 20]"));
    }
}
