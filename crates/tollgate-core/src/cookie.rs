//! Cookie names and `Set-Cookie` header values for the token pair.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::CookiePolicy;

const ACCESS_COOKIE: &str = "accessToken";
const REFRESH_COOKIE: &str = "refreshToken";
const HOST_PREFIX: &str = "__Host-";

/// Names of the two token cookies under a given policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieNames {
    pub access: String,
    pub refresh: String,
}

impl CookieNames {
    pub fn for_policy(policy: &CookiePolicy) -> Self {
        let prefix = if policy.host_prefix { HOST_PREFIX } else { "" };
        Self {
            access: format!("{}{}", prefix, ACCESS_COOKIE),
            refresh: format!("{}{}", prefix, REFRESH_COOKIE),
        }
    }
}

/// Builds `Set-Cookie` values from a validated [`CookiePolicy`].
#[derive(Debug, Clone)]
pub struct CookieJar {
    policy: CookiePolicy,
    names: CookieNames,
}

impl CookieJar {
    pub fn new(policy: CookiePolicy) -> Self {
        let names = CookieNames::for_policy(&policy);
        Self { policy, names }
    }

    pub fn names(&self) -> &CookieNames {
        &self.names
    }

    pub fn access(&self, token: &str, max_age: Duration) -> String {
        self.build(&self.names.access, token, max_age.as_secs())
    }

    pub fn refresh(&self, token: &str, max_age: Duration) -> String {
        self.build(&self.names.refresh, token, max_age.as_secs())
    }

    /// Expire both token cookies.
    pub fn clear(&self) -> [String; 2] {
        [
            self.build(&self.names.access, "", 0),
            self.build(&self.names.refresh, "", 0),
        ]
    }

    fn build(&self, name: &str, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite={}",
            name, value, max_age, self.policy.same_site
        );
        if let Some(domain) = &self.policy.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        if self.policy.secure {
            cookie.push_str("; Secure");
        }
        if self.policy.http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie
    }
}

/// Parse a `Cookie` request header into name/value pairs.
///
/// Malformed pairs are skipped. The first occurrence of a name wins.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in header.split(';') {
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim().trim_matches('"');
        cookies
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }
    cookies
}
