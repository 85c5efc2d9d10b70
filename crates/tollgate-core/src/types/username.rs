//! Username type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, InvalidInputError};

const MAX_USERNAME_LEN: usize = 64;

/// A trimmed, non-empty username.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Trim and validate a username.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed name is empty or longer than 64 characters.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let trimmed = s.as_ref().trim();

        if trimmed.is_empty() {
            return Err(InvalidInputError::Username {
                value: s.as_ref().to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if trimmed.chars().count() > MAX_USERNAME_LEN {
            return Err(InvalidInputError::Username {
                value: trimmed.to_string(),
                reason: format!("must be at most {} characters", MAX_USERNAME_LEN),
            }
            .into());
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_whitespace() {
        assert_eq!(Username::new("  jane ").unwrap().as_str(), "jane");
    }

    #[test]
    fn rejects_blank() {
        assert!(Username::new("   ").is_err());
    }

    #[test]
    fn rejects_overlong() {
        assert!(Username::new("x".repeat(65)).is_err());
        assert!(Username::new("x".repeat(64)).is_ok());
    }
}
