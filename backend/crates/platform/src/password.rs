//! Password and Secret Hashing
//!
//! Argon2id hashing for user passwords and for short-lived secrets
//! (OTP codes, password reset tokens).
//!
//! - Passwords pass a NIST SP 800-63B style policy before hashing
//! - Clear text is zeroized on drop
//! - An optional application pepper is appended before hashing

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,

    #[error("Password is too common or follows a predictable pattern")]
    CommonPattern,
}

/// Hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password
// ============================================================================

/// Clear text password, zeroized on drop and redacted in Debug output.
///
/// ```rust
/// use platform::password::ClearTextPassword;
///
/// let password = ClearTextPassword::new("Correct-Horse-42".to_string()).unwrap();
/// let hashed = password.hash(None).unwrap();
/// assert!(hashed.verify(&password, None));
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Validate and wrap a password. Input is NFKC-normalized first and
    /// length is counted in code points.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        let char_count = normalized.chars().count();
        if char_count < MIN_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooShort {
                min: MIN_PASSWORD_LENGTH,
                actual: char_count,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordPolicyError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        if is_common_pattern(&normalized) {
            return Err(PasswordPolicyError::CommonPattern);
        }

        Ok(Self(normalized))
    }

    /// Wrap a candidate password for verification only.
    ///
    /// Login must not apply the policy: a stored password that predates a
    /// policy change still has to verify.
    pub fn for_verification(raw: String) -> Self {
        Self(raw.nfkc().collect())
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash with Argon2id, returning a PHC string wrapper
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        hash_bytes(self.as_bytes(), pepper).map(|hash| HashedPassword { hash })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password
// ============================================================================

/// Argon2id hash in PHC string format, safe to store.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Load from a stored PHC string
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash. The pepper must match the one
    /// used at hashing time.
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        verify_bytes(&self.hash, password.as_bytes(), pepper)
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Short-lived secrets
// ============================================================================

/// Hash a server-generated secret (OTP code, reset token) with Argon2id.
///
/// `salt` is an application-level secret appended to the value; Argon2 still
/// generates its own per-hash salt.
pub fn hash_secret(secret: &str, salt: Option<&[u8]>) -> Result<String, PasswordHashError> {
    hash_bytes(secret.as_bytes(), salt)
}

/// Verify a secret against a PHC string produced by [`hash_secret`].
/// Malformed hashes never verify.
pub fn verify_secret(secret: &str, phc: &str, salt: Option<&[u8]>) -> bool {
    verify_bytes(phc, secret.as_bytes(), salt)
}

fn peppered(value: &[u8], pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
    let mut combined = Zeroizing::new(value.to_vec());
    if let Some(p) = pepper {
        combined.extend_from_slice(p);
    }
    combined
}

fn hash_bytes(value: &[u8], pepper: Option<&[u8]>) -> Result<String, PasswordHashError> {
    let input = peppered(value, pepper);
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(&input, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))
}

fn verify_bytes(phc: &str, value: &[u8], pepper: Option<&[u8]>) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    let input = peppered(value, pepper);

    Argon2::default().verify_password(&input, &parsed).is_ok()
}

// ============================================================================
// Weak pattern detection
// ============================================================================

fn is_common_pattern(password: &str) -> bool {
    let lower = password.to_lowercase();

    let mut chars = lower.chars();
    if let Some(first) = chars.next() {
        if chars.all(|c| c == first) {
            return true;
        }
    }

    if is_sequential_numbers(&lower) {
        return true;
    }

    const KEYBOARD_PATTERNS: &[&str] = &["qwerty", "asdfgh", "zxcvbn", "qazwsx", "1qaz2wsx"];
    if KEYBOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "abcdefgh",
        "letmein1",
        "welcome1",
        "admin123",
        "iloveyou",
        "sunshine",
        "princess",
        "football",
        "baseball",
        "trustno1",
    ];
    COMMON_PASSWORDS.contains(&lower.as_str())
}

fn is_sequential_numbers(s: &str) -> bool {
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() < 4 || digits.len() != s.chars().count() {
        return false;
    }

    let ascending = digits
        .windows(2)
        .all(|w| w[1] == (w[0] + 1) % 10);
    let descending = digits
        .windows(2)
        .all(|w| w[0] == (w[1] + 1) % 10);

    ascending || descending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_bounds() {
        assert!(matches!(
            ClearTextPassword::new("short".to_string()),
            Err(PasswordPolicyError::TooShort { min: 8, actual: 5 })
        ));
        assert!(matches!(
            ClearTextPassword::new("ab".repeat(MAX_PASSWORD_LENGTH)),
            Err(PasswordPolicyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_password_whitespace_only() {
        assert_eq!(
            ClearTextPassword::new("        ".to_string()).unwrap_err(),
            PasswordPolicyError::EmptyOrWhitespace
        );
    }

    #[test]
    fn test_password_control_character() {
        assert_eq!(
            ClearTextPassword::new("abc\u{7}defgh1".to_string()).unwrap_err(),
            PasswordPolicyError::InvalidCharacter
        );
    }

    #[test]
    fn test_password_common_pattern() {
        for weak in ["password123", "qwertyuiop", "12345678", "98765432", "zzzzzzzz"] {
            assert_eq!(
                ClearTextPassword::new(weak.to_string()).unwrap_err(),
                PasswordPolicyError::CommonPattern,
                "{weak} should be rejected"
            );
        }
    }

    #[test]
    fn test_valid_passwords() {
        assert!(ClearTextPassword::new("MySecure#Pass2024!".to_string()).is_ok());
        assert!(ClearTextPassword::new("ブログを書くのが好き!".to_string()).is_ok());
    }

    #[test]
    fn test_hash_and_verify_with_pepper() {
        let password = ClearTextPassword::for_verification("TestPassword123!".to_string());
        let pepper = b"pepper";
        let hashed = password.hash(Some(pepper)).unwrap();

        assert!(hashed.verify(&password, Some(pepper)));
        assert!(!hashed.verify(&password, None));

        let wrong = ClearTextPassword::for_verification("TestPassword124!".to_string());
        assert!(!hashed.verify(&wrong, Some(pepper)));
    }

    #[test]
    fn test_phc_string_restore() {
        let password = ClearTextPassword::for_verification("TestPassword123!".to_string());
        let hashed = password.hash(None).unwrap();

        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&password, None));
        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_secret_hash_uses_salt() {
        let phc = hash_secret("042917", Some(b"otp-salt")).unwrap();

        assert!(verify_secret("042917", &phc, Some(b"otp-salt")));
        assert!(!verify_secret("042918", &phc, Some(b"otp-salt")));
        assert!(!verify_secret("042917", &phc, Some(b"other-salt")));
        assert!(!verify_secret("042917", "garbage", Some(b"otp-salt")));
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::for_verification("secret-value".to_string());
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret-value"));
    }
}
