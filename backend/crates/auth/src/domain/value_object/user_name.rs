//! User Name Value Object
//!
//! The public handle shown as the author of posts and comments, and one of
//! the two login identifiers.
//!
//! Input is NFKC-normalized and trimmed. The displayed form keeps the
//! user's casing; uniqueness and lookups use the lowercase canonical form.
//!
//! Rules (after normalization):
//! - 3 to 30 characters from `a-z 0-9 _ . -`
//! - starts and ends with a letter, digit or `_`
//! - no `..`, at least one letter or digit
//! - not a reserved route or staff name

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

pub const USER_NAME_MIN_LENGTH: usize = 3;
pub const USER_NAME_MAX_LENGTH: usize = 30;

const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-'];

/// Names that collide with routes or impersonate staff
const RESERVED_WORDS: &[&str] = &[
    "admin",
    "administrator",
    "superadmin",
    "root",
    "system",
    "moderator",
    "staff",
    "support",
    "api",
    "auth",
    "login",
    "logout",
    "register",
    "blog",
    "blogs",
    "comments",
    "reactions",
    "user",
    "users",
    "me",
    "settings",
    "editor",
    "anonymous",
    "deleted",
    "null",
    "undefined",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserNameError {
    Empty,
    TooShort { length: usize, min: usize },
    TooLong { length: usize, max: usize },
    InvalidCharacter { char: char, position: usize },
    InvalidBoundary { char: char },
    ConsecutiveDots,
    NoAlphanumeric,
    Reserved { word: String },
}

impl fmt::Display for UserNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Username cannot be empty"),
            Self::TooShort { length, min } => {
                write!(f, "Username is too short ({length} chars, minimum {min})")
            }
            Self::TooLong { length, max } => {
                write!(f, "Username is too long ({length} chars, maximum {max})")
            }
            Self::InvalidCharacter { char, position } => write!(
                f,
                "Invalid character '{char}' at position {position}. Only a-z, 0-9, _, ., - are allowed"
            ),
            Self::InvalidBoundary { char } => write!(
                f,
                "Username cannot start or end with '{char}'"
            ),
            Self::ConsecutiveDots => write!(f, "Username cannot contain consecutive dots"),
            Self::NoAlphanumeric => {
                write!(f, "Username must contain at least one letter or digit")
            }
            Self::Reserved { word } => write!(f, "'{word}' is a reserved username"),
        }
    }
}

impl std::error::Error for UserNameError {}

/// Validated user name
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName {
    original: String,
    canonical: String,
}

impl UserName {
    pub fn new(input: impl AsRef<str>) -> Result<Self, UserNameError> {
        let original: String = input.as_ref().nfkc().collect::<String>().trim().to_string();
        let canonical = original.to_lowercase();
        Self::validate(&canonical)?;
        Ok(Self {
            original,
            canonical,
        })
    }

    /// Stored values were validated on the way in
    pub fn from_db(original: &str) -> Self {
        Self {
            original: original.to_string(),
            canonical: original.to_lowercase(),
        }
    }

    /// As typed by the user
    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Lowercase form used for uniqueness
    #[inline]
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    fn validate(canonical: &str) -> Result<(), UserNameError> {
        let (Some(first), Some(last)) = (canonical.chars().next(), canonical.chars().next_back())
        else {
            return Err(UserNameError::Empty);
        };

        let length = canonical.chars().count();
        if length < USER_NAME_MIN_LENGTH {
            return Err(UserNameError::TooShort {
                length,
                min: USER_NAME_MIN_LENGTH,
            });
        }
        if length > USER_NAME_MAX_LENGTH {
            return Err(UserNameError::TooLong {
                length,
                max: USER_NAME_MAX_LENGTH,
            });
        }

        if let Some((position, char)) = canonical
            .chars()
            .enumerate()
            .find(|(_, c)| !Self::is_valid_char(*c))
        {
            return Err(UserNameError::InvalidCharacter { char, position });
        }

        for edge in [first, last] {
            if !Self::is_valid_boundary_char(edge) {
                return Err(UserNameError::InvalidBoundary { char: edge });
            }
        }

        if canonical.contains("..") {
            return Err(UserNameError::ConsecutiveDots);
        }

        if !canonical.chars().any(|c| c.is_ascii_alphanumeric()) {
            return Err(UserNameError::NoAlphanumeric);
        }

        if RESERVED_WORDS.contains(&canonical) {
            return Err(UserNameError::Reserved {
                word: canonical.to_string(),
            });
        }

        Ok(())
    }

    #[inline]
    fn is_valid_char(c: char) -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || ALLOWED_SPECIAL_CHARS.contains(&c)
    }

    #[inline]
    fn is_valid_boundary_char(c: char) -> bool {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserName").field(&self.original).finish()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl TryFrom<String> for UserName {
    type Error = UserNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.original
    }
}
