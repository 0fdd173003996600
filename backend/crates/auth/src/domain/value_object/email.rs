//! Email Value Object
//!
//! Syntactic validation only. Ownership is proven through the OTP flow.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Lowercased, trimmed email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> AppResult<Self> {
        let email = email.into().trim().to_lowercase();

        if email.is_empty() {
            return Err(AppError::bad_request("Email cannot be empty"));
        }

        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Email must be at most {} characters",
                EMAIL_MAX_LENGTH
            )));
        }

        if !Self::is_valid_format(&email) {
            return Err(AppError::bad_request("Invalid email format")
                .with_action("Enter an address like name@example.com"));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > 64 || local.chars().any(char::is_whitespace) {
            return false;
        }

        if domain.is_empty() || domain.contains('@') || !domain.contains('.') {
            return false;
        }

        let domain_chars_ok = domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

        domain_chars_ok
            && !domain.starts_with(['.', '-'])
            && !domain.ends_with(['.', '-'])
            && !domain.contains("..")
    }

    /// Stored values were validated on the way in
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or("")
    }
}

impl FromStr for Email {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        Email::new(s)
    }
}

impl TryFrom<String> for Email {
    type Error = AppError;

    fn try_from(value: String) -> AppResult<Self> {
        Email::new(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
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
    fn test_email_valid() {
        assert!(Email::new("writer@example.com").is_ok());
        assert!(Email::new("first.last@blog.co.uk").is_ok());
        assert!(Email::new("writer+drafts@example.com").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        for bad in [
            "",
            "writerexample.com",
            "writer@",
            "@example.com",
            "writer@@example.com",
            "writer@example",
            "writer@exa..mple.com",
            "wri ter@example.com",
            "writer@-example.com",
        ] {
            assert!(Email::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_email_normalized() {
        let email = Email::new("  Writer@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "writer@example.com");
        assert_eq!(email.local_part(), "writer");
    }

    #[test]
    fn test_email_deserialize_validates() {
        let ok: Email = serde_json::from_str("\"A@B.io\"").unwrap();
        assert_eq!(ok.as_str(), "a@b.io");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }
}
