//! Normalized email address type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A normalized email address.
///
/// Construction trims surrounding whitespace and lowercases the address, so
/// two spellings of the same mailbox compare equal.
///
/// # Example
///
/// ```
/// use tollgate_core::Email;
///
/// let email = Email::new("  Jane@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "jane@example.com");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Normalize and validate an email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is not of the form `local@domain.tld`.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let normalized = Self::normalize(s.as_ref());
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    /// Trim and lowercase without validating.
    pub fn normalize(s: &str) -> String {
        s.trim().to_lowercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let invalid = |reason: &str| -> Error {
            InvalidInputError::Email {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        let (local, domain) = s.rsplit_once('@').ok_or_else(|| invalid("missing '@'"))?;

        if local.is_empty() {
            return Err(invalid("empty local part"));
        }

        match domain.rsplit_once('.') {
            Some((host, tld)) if !host.is_empty() && !tld.is_empty() => {}
            _ => return Err(invalid("domain must contain a '.'")),
        }

        if s.chars().any(char::is_whitespace) {
            return Err(invalid("must not contain whitespace"));
        }

        Ok(())
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Email {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Email {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let email = Email::new("\tJane.Doe@Example.Com\n").unwrap();
        assert_eq!(email.as_str(), "jane.doe@example.com");
    }

    #[test]
    fn rejects_missing_at() {
        assert!(Email::new("jane.example.com").is_err());
    }

    #[test]
    fn rejects_domain_without_dot() {
        assert!(Email::new("jane@localhost").is_err());
        assert!(Email::new("jane@.com").is_err());
    }

    #[test]
    fn rejects_inner_whitespace() {
        assert!(Email::new("ja ne@example.com").is_err());
    }
}
