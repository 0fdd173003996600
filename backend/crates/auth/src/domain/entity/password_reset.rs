//! Password reset token
//!
//! One record per email, holding the hash of the latest token and a daily
//! request counter whose window opened at `created_at`.

use chrono::{DateTime, Utc};

use crate::domain::value_object::email::Email;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetToken {
    pub email: Email,
    /// Argon2id PHC string of the emailed token
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub request_count: u32,
    /// Start of the daily request window
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn first(email: Email, token_hash: String, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            email,
            token_hash,
            expires_at,
            used: false,
            request_count: 1,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Unexpired and unused
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.used && !self.is_expired(now)
    }

    pub fn reset_window(&mut self, now: DateTime<Utc>) {
        self.request_count = 0;
        self.created_at = now;
    }

    pub fn reissue(&mut self, token_hash: String, expires_at: DateTime<Utc>) {
        self.token_hash = token_hash;
        self.expires_at = expires_at;
        self.used = false;
        self.request_count += 1;
    }

    pub fn mark_used(&mut self) {
        self.used = true;
    }
}
