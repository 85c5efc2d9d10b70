//! Process-wide authentication configuration.
//!
//! Built once at start-up, validated, then shared read-only (usually behind an
//! `Arc`). Nothing in this crate re-reads or mutates it per request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;
use crate::hashing::WorkFactor;

const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECS: u64 = 30 * 24 * 60 * 60;
const DEFAULT_LEEWAY_SECS: u64 = 5;
const DEFAULT_SESSION_PAGE_SIZE: usize = 50;

/// Authentication settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// PEM-encoded RSA private key. Raw or `\n`-escaped newlines.
    pub private_key: String,
    /// PEM-encoded RSA public key. Raw or `\n`-escaped newlines.
    pub public_key: String,
    pub issuer: String,
    pub audience: String,
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: u64,
    /// Clock-skew tolerance applied to expiry checks.
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
    #[serde(default)]
    pub work_factor: WorkFactor,
    /// Upper bound on each store call. Unset means no bound.
    #[serde(default)]
    pub store_timeout_ms: Option<u64>,
    #[serde(default = "default_page_size")]
    pub session_page_size: usize,
    #[serde(default)]
    pub cookie: CookiePolicy,
}

fn default_access_ttl() -> u64 {
    DEFAULT_ACCESS_TTL_SECS
}

fn default_refresh_ttl() -> u64 {
    DEFAULT_REFRESH_TTL_SECS
}

fn default_leeway() -> u64 {
    DEFAULT_LEEWAY_SECS
}

fn default_page_size() -> usize {
    DEFAULT_SESSION_PAGE_SIZE
}

impl AuthConfig {
    /// Create a config with default TTLs, cookie policy, and work factor.
    pub fn new(
        private_key: impl Into<String>,
        public_key: impl Into<String>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Self {
        Self {
            private_key: private_key.into(),
            public_key: public_key.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            access_token_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            leeway_secs: DEFAULT_LEEWAY_SECS,
            work_factor: WorkFactor::default(),
            store_timeout_ms: None,
            session_page_size: DEFAULT_SESSION_PAGE_SIZE,
            cookie: CookiePolicy::default(),
        }
    }

    /// Check cross-field constraints. Key material is checked by the codec.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(invalid("issuer", "must not be empty"));
        }
        if self.audience.trim().is_empty() {
            return Err(invalid("audience", "must not be empty"));
        }
        if self.access_token_ttl_secs == 0 {
            return Err(invalid("access_token_ttl_secs", "must be positive"));
        }
        if self.refresh_token_ttl_secs <= self.access_token_ttl_secs {
            return Err(invalid(
                "refresh_token_ttl_secs",
                "must be greater than access_token_ttl_secs",
            ));
        }
        if self.session_page_size == 0 {
            return Err(invalid("session_page_size", "must be positive"));
        }
        if self.store_timeout_ms == Some(0) {
            return Err(invalid("store_timeout_ms", "must be positive when set"));
        }
        self.cookie.validate()
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_secs)
    }

    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("private_key", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("work_factor", &self.work_factor)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("session_page_size", &self.session_page_size)
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Normalize PEM text supplied with escaped or CRLF newlines.
pub fn normalize_pem(key: &str) -> String {
    key.replace("\\n", "\n").replace("\r\n", "\n").trim().to_string()
}

/// SameSite cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// How token cookies are scoped and tagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookiePolicy {
    pub domain: Option<String>,
    pub same_site: SameSite,
    pub secure: bool,
    pub http_only: bool,
    /// Prefix cookie names with `__Host-`.
    pub host_prefix: bool,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            domain: None,
            same_site: SameSite::Strict,
            secure: true,
            http_only: true,
            host_prefix: false,
        }
    }
}

impl CookiePolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |reason: &str| ConfigError::CookiePolicy {
            reason: reason.to_string(),
        };

        if self.host_prefix && self.domain.is_some() {
            return Err(fail("host_prefix requires no domain"));
        }
        if self.host_prefix && !self.secure {
            return Err(fail("host_prefix requires secure cookies"));
        }
        if self.same_site == SameSite::None && !self.secure {
            return Err(fail("same_site = none requires secure cookies"));
        }
        Ok(())
    }
}
