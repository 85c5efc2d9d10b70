//! Password policy for new and changed passwords.

use crate::error::{Error, InvalidInputError};

const MIN_LEN: usize = 10;
const MAX_LEN: usize = 64;
const SPECIALS: &str = "!@#$%^&+=";

/// Check a plaintext password against the password policy.
///
/// Applies only when a password is set. Login compares whatever the caller
/// sends against the stored hash.
///
/// # Errors
///
/// Returns [`InvalidInputError::Password`] naming the first failed rule.
pub fn validate_password(password: &str) -> Result<(), Error> {
    let fail = |reason: String| -> Error { InvalidInputError::Password { reason }.into() };

    let len = password.chars().count();
    if len < MIN_LEN {
        return Err(fail(format!(
            "must be at least {} characters long",
            MIN_LEN
        )));
    }
    if len > MAX_LEN {
        return Err(fail(format!(
            "must be no more than {} characters long",
            MAX_LEN
        )));
    }
    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c))
    {
        return Err(fail("contains invalid characters".to_string()));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(fail("must include at least one number".to_string()));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(fail(
            "must include at least one uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(fail(
            "must include at least one lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| SPECIALS.contains(c)) {
        return Err(fail(format!(
            "must include at least one of '{}'",
            SPECIALS
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_compliant_password() {
        assert!(validate_password("Password123!").is_ok());
        assert!(validate_password("aB3=aB3=aB3=").is_ok());
    }

    #[test]
    fn rejects_short_and_long() {
        assert!(validate_password("Pa1!").is_err());
        let long = format!("Aa1!{}", "a".repeat(61));
        assert!(validate_password(&long).is_err());
    }

    #[test]
    fn rejects_missing_classes() {
        assert!(validate_password("password123!").is_err());
        assert!(validate_password("PASSWORD123!").is_err());
        assert!(validate_password("Passwordabc!").is_err());
        assert!(validate_password("Password1234").is_err());
    }

    #[test]
    fn rejects_characters_outside_allowed_set() {
        let err = validate_password("Password 123!").unwrap_err();
        assert!(err.to_string().contains("invalid characters"));
    }
}
