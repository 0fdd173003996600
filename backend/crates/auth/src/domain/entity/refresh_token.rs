//! Refresh Token Entity
//!
//! The server keeps a SHA-256 digest of the issued token, never the token.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use platform::crypto::{constant_time_eq, sha256_hex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub user_id: UserId,
    /// Hex SHA-256 of the token string
    pub token_hash: String,
    pub revoked: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(user_id: UserId, raw_token: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            token_hash: Self::digest(raw_token),
            revoked: false,
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Lookup key for a presented token
    pub fn digest(raw_token: &str) -> String {
        sha256_hex(raw_token.as_bytes())
    }

    pub fn matches(&self, raw_token: &str) -> bool {
        constant_time_eq(
            self.token_hash.as_bytes(),
            Self::digest(raw_token).as_bytes(),
        )
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired(now)
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Remaining lifetime has dropped below `threshold`
    pub fn is_near_expiry(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.remaining(now) < threshold
    }

    pub fn revoke(&mut self) {
        self.revoked = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_only() {
        let token = RefreshToken::new(UserId::new(), "header.payload.sig", Utc::now());
        assert_ne!(token.token_hash, "header.payload.sig");
        assert_eq!(token.token_hash.len(), 64);
        assert!(token.matches("header.payload.sig"));
        assert!(!token.matches("header.payload.sih"));
    }

    #[test]
    fn test_lifecycle() {
        let now = Utc::now();
        let mut token = RefreshToken::new(UserId::new(), "t", now + Duration::hours(1));

        assert!(token.is_active(now));
        assert!(token.is_near_expiry(now, Duration::hours(2)));
        assert!(!token.is_near_expiry(now, Duration::minutes(30)));
        assert!(token.is_expired(now + Duration::hours(1)));

        token.revoke();
        assert!(!token.is_active(now));
    }
}
