//! Opaque token wrappers.

use std::fmt;

/// A short-lived signed credential proving identity for a request window.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Only the token codec looks inside
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a compact token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the compact token string.
    ///
    /// # Security
    ///
    /// Use only when writing cookies, headers, or response bodies.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A long-lived signed credential used only to mint new access tokens.
///
/// The refresh token is reusable until its own expiry or until its session is
/// invalidated. Renewal never re-mints it.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Wrap a compact token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the compact token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// Tokens a caller presented with a request.
///
/// Empty strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct PresentedTokens {
    pub access: Option<AccessToken>,
    pub refresh: Option<RefreshToken>,
}

impl PresentedTokens {
    pub fn new(access: Option<&str>, refresh: Option<&str>) -> Self {
        Self {
            access: access
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(AccessToken::new),
            refresh: refresh
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(RefreshToken::new),
        }
    }

    /// Returns true if neither token was presented.
    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_hides_value_in_debug() {
        let token = AccessToken::new("eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("eyJ"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn refresh_token_hides_value_in_debug() {
        let token = RefreshToken::new("refresh_token_value_here");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("refresh_token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn blank_tokens_count_as_absent() {
        let presented = PresentedTokens::new(Some("  "), Some(""));
        assert!(presented.is_empty());

        let presented = PresentedTokens::new(Some("abc"), None);
        assert!(!presented.is_empty());
        assert_eq!(presented.access.unwrap().as_str(), "abc");
    }
}
