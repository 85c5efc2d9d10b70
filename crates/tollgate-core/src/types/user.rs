//! User records and their projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;
use crate::hashing::PasswordHash;

use super::{Email, UserId, Username, validate_password};

/// The subset of a user record safe to return to any caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A public user paired with the current password version.
///
/// Used for internal decisions only; the version is never sent to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedUser {
    pub user: PublicUser,
    pub password_version: u64,
}

/// The only projection that carries the password hash.
///
/// Deliberately not `Serialize`: nothing may write this to a response.
#[derive(Debug, Clone)]
pub struct UserSecrets {
    pub password_hash: PasswordHash,
    pub password_version: u64,
    pub user: PublicUser,
}

/// Full persisted user record.
///
/// This is the durable layout every storage backend honors. The hash and
/// version travel together in one record so a reader always sees a matching
/// pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub password_version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Build a fresh record. The first hash counts as version 1.
    pub fn new(username: Username, email: Email, password_hash: PasswordHash) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::generate(),
            username,
            email,
            password_hash,
            password_version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the hash and bump the version in one step.
    pub fn set_password_hash(&mut self, password_hash: PasswordHash) -> u64 {
        self.password_hash = password_hash;
        self.password_version += 1;
        self.updated_at = Utc::now();
        self.password_version
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_versioned(&self) -> VersionedUser {
        VersionedUser {
            user: self.to_public(),
            password_version: self.password_version,
        }
    }

    pub fn to_secrets(&self) -> UserSecrets {
        UserSecrets {
            password_hash: self.password_hash.clone(),
            password_version: self.password_version,
            user: self.to_public(),
        }
    }
}

/// A validated registration request.
#[derive(Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    password: String,
}

impl NewUser {
    /// Validate username, email, and password policy.
    pub fn new(
        username: impl AsRef<str>,
        email: impl AsRef<str>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let password = password.into();
        validate_password(&password)?;
        Ok(Self {
            username: Username::new(username)?,
            email: Email::new(email)?,
            password,
        })
    }

    /// Returns the plaintext password for hashing.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord::new(
            Username::new("jane").unwrap(),
            Email::new("jane@example.com").unwrap(),
            PasswordHash::new("$2b$04$abcdefghijklmnopqrstuv"),
        )
    }

    #[test]
    fn first_hash_is_version_one() {
        assert_eq!(record().password_version, 1);
    }

    #[test]
    fn set_password_hash_bumps_version() {
        let mut rec = record();
        let v = rec.set_password_hash(PasswordHash::new("$2b$04$other"));
        assert_eq!(v, 2);
        assert_eq!(rec.password_version, 2);
        assert_eq!(rec.password_hash.as_str(), "$2b$04$other");
    }

    #[test]
    fn public_projection_omits_secrets() {
        let json = serde_json::to_value(record().to_public()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("id"));
        assert!(obj.contains_key("createdAt"));
        assert!(!obj.contains_key("passwordHash"));
        assert!(!obj.contains_key("passwordVersion"));
    }

    #[test]
    fn record_layout_uses_camel_case() {
        let json = serde_json::to_value(record()).unwrap();
        assert!(json.get("passwordHash").is_some());
        assert_eq!(json["passwordVersion"], 1);
    }

    #[test]
    fn new_user_hides_password() {
        let user = NewUser::new("jane", "Jane@Example.com", "Password123!").unwrap();
        assert_eq!(user.email.as_str(), "jane@example.com");
        assert!(!format!("{:?}", user).contains("Password123!"));
    }

    #[test]
    fn new_user_enforces_policy() {
        assert!(NewUser::new("jane", "jane@example.com", "short").is_err());
    }
}
