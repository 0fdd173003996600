//! One-time email verification code
//!
//! One record per email. `attempts` counts issued codes inside the window
//! that opened at `created_at`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_object::email::Email;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Otp {
    pub otp_id: Uuid,
    pub email: Email,
    /// Argon2id PHC string of code + salt
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
    /// Start of the current attempt window
    pub created_at: DateTime<Utc>,
}

impl Otp {
    /// First code issued for `email`
    pub fn first(email: Email, code_hash: String, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            otp_id: Uuid::new_v4(),
            email,
            code_hash,
            expires_at,
            attempts: 1,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Restart the attempt window
    pub fn reset_window(&mut self, now: DateTime<Utc>) {
        self.attempts = 0;
        self.created_at = now;
    }

    /// Replace the code and count the attempt
    pub fn reissue(&mut self, code_hash: String, expires_at: DateTime<Utc>) {
        self.code_hash = code_hash;
        self.expires_at = expires_at;
        self.attempts += 1;
    }
}
