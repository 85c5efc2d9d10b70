//! Session records and their projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SessionId, UserId};

const MAX_USER_AGENT_LEN: usize = 512;

/// One authenticated client context (one login).
///
/// `valid` only ever moves from true to false. A revoked session is never
/// revived; logging in again creates a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    /// Owning user. Records written under the legacy `user` name still load.
    #[serde(alias = "user")]
    pub user_id: UserId,
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_valid() -> bool {
    true
}

impl Session {
    /// Build a fresh, valid session for a user.
    pub fn new(user_id: UserId, user_agent: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            user_id,
            valid: true,
            user_agent: normalize_user_agent(user_agent),
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the session invalid. Returns false if it already was.
    pub fn invalidate(&mut self) -> bool {
        if !self.valid {
            return false;
        }
        self.valid = false;
        self.updated_at = Utc::now();
        true
    }

    pub fn to_ref(&self) -> SessionRef {
        SessionRef {
            id: self.id,
            valid: self.valid,
            user_id: self.user_id,
        }
    }

    pub fn to_public(&self) -> PublicSession {
        PublicSession {
            id: self.id,
            user_agent: self.user_agent.clone(),
            valid: self.valid,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Minimal projection used on the renewal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRef {
    pub id: SessionId,
    pub valid: bool,
    pub user_id: UserId,
}

/// Session fields safe to show the owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSession {
    pub id: SessionId,
    pub user_agent: Option<String>,
    pub valid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Trim a user-agent, drop it if blank, and cap its length.
pub fn normalize_user_agent(user_agent: Option<&str>) -> Option<String> {
    let ua = user_agent?.trim();
    if ua.is_empty() {
        return None;
    }
    Some(ua.chars().take(MAX_USER_AGENT_LEN).collect())
}
