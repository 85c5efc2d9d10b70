//! Login credentials type.

use std::fmt;

use crate::types::Email;

/// Login credentials: an email address and a plaintext password.
///
/// The email is kept as supplied. [`lookup_email`](Self::lookup_email) gives
/// the normalized key the credential store is searched by; a malformed
/// address has no key and fails like an unknown one.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use tollgate_core::Credentials;
///
/// let creds = Credentials::new("jane@example.com", "Password123!");
/// assert_eq!(creds.email(), "jane@example.com");
/// ```
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Returns the email as supplied.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The trimmed, lowercased email, or `None` if it is not an address.
    pub fn lookup_email(&self) -> Option<Email> {
        Email::new(&self.email).ok()
    }

    /// Returns the password.
    ///
    /// # Security
    ///
    /// Use this only when comparing against a stored hash.
    /// Never log or display this value.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
