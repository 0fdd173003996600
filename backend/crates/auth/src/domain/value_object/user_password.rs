//! User Password Value Object
//!
//! Domain wrappers over `platform::password`:
//! - [`RawPassword`]: user input, zeroized on drop
//! - [`UserPassword`]: Argon2id PHC string, the only form that is stored
//!
//! ```rust
//! use auth::domain::value_object::user_password::{RawPassword, UserPassword};
//!
//! let raw = RawPassword::new("Tea-And-Markdown-9".to_string()).unwrap();
//! let hashed = UserPassword::from_raw(&raw, None).unwrap();
//! assert!(hashed.verify(&raw, None));
//! ```

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;

/// Password as typed by the user
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Validate a new password against the policy (registration, change, reset)
    pub fn new(raw: String) -> AppResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(policy_error)?;
        Ok(Self(clear_text))
    }

    /// Wrap a login candidate without applying the policy
    pub fn for_verification(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

fn policy_error(err: PasswordPolicyError) -> AppError {
    let action = match &err {
        PasswordPolicyError::TooShort { .. } => "Choose a longer password",
        PasswordPolicyError::TooLong { .. } => "Choose a shorter password",
        PasswordPolicyError::EmptyOrWhitespace => "Enter a password",
        PasswordPolicyError::InvalidCharacter => "Remove control characters",
        PasswordPolicyError::CommonPattern => "Choose a less predictable password",
    };
    AppError::bad_request(err.to_string()).with_action(action)
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// Hashed password as stored on the user document
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AppResult<Self> {
        raw.inner()
            .hash(pepper)
            .map(Self)
            .map_err(|e| AppError::internal("Password hashing failed").with_source(e))
    }

    pub fn from_phc_string(phc_string: impl Into<String>) -> AppResult<Self> {
        HashedPassword::from_phc_string(phc_string)
            .map(Self)
            .map_err(|e| AppError::internal("Invalid password hash in database").with_source(e))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::error::kind::ErrorKind;

    #[test]
    fn test_policy_errors_are_bad_requests() {
        let err = RawPassword::new("short".to_string()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.action(), Some("Choose a longer password"));

        let err = RawPassword::new("password123".to_string()).unwrap_err();
        assert_eq!(err.action(), Some("Choose a less predictable password"));
    }

    #[test]
    fn test_hash_and_verify() {
        let raw = RawPassword::new("Tea-And-Markdown-9".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, Some(b"pepper")).unwrap();

        assert!(hashed.verify(&raw, Some(b"pepper")));
        assert!(!hashed.verify(&raw, None));

        let wrong = RawPassword::for_verification("Tea-And-Markdown-8".to_string());
        assert!(!hashed.verify(&wrong, Some(b"pepper")));
    }

    #[test]
    fn test_login_candidate_skips_policy() {
        // A weak candidate must still be comparable so that login can fail
        // with the generic credentials error instead of a policy message.
        let raw = RawPassword::for_verification("short".to_string());
        let stored = UserPassword::from_raw(
            &RawPassword::new("Tea-And-Markdown-9".to_string()).unwrap(),
            None,
        )
        .unwrap();
        assert!(!stored.verify(&raw, None));
    }

    #[test]
    fn test_restore_from_phc() {
        let raw = RawPassword::new("Tea-And-Markdown-9".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None).unwrap();
        let restored = UserPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&raw, None));
        assert!(UserPassword::from_phc_string("plain").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::new("Tea-And-Markdown-9".to_string()).unwrap();
        assert!(!format!("{:?}", raw).contains("Markdown"));
    }
}
