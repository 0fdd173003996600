//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::rate_limit::RateLimitConfig;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

pub const ACCESS_COOKIE_NAME: &str = "access_token";
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 key for access tokens
    pub access_secret: Vec<u8>,
    /// HS256 key for refresh tokens, distinct from the access key
    pub refresh_secret: Vec<u8>,
    /// Access token lifetime (15 minutes)
    pub access_ttl: Duration,
    /// Refresh token lifetime (7 days)
    pub refresh_ttl: Duration,
    /// Rotate the refresh token once its remaining lifetime drops below this
    pub rotation_threshold: Duration,
    /// OTP code lifetime (5 minutes)
    pub otp_ttl: Duration,
    /// Codes issued per window
    pub otp_limit: RateLimitConfig,
    /// Server-side secret appended to the code before hashing
    pub otp_salt: Vec<u8>,
    /// Reset token lifetime (15 minutes)
    pub reset_ttl: Duration,
    /// Reset requests per window
    pub reset_limit: RateLimitConfig,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Deadline applied to every use case
    pub request_timeout: Duration,
    /// Base URL for links in outgoing email
    pub frontend_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: Vec::new(),
            refresh_secret: Vec::new(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),
            rotation_threshold: Duration::from_secs(2 * 3600),
            otp_ttl: Duration::from_secs(5 * 60),
            otp_limit: RateLimitConfig::daily(5),
            otp_salt: Vec::new(),
            reset_ttl: Duration::from_secs(15 * 60),
            reset_limit: RateLimitConfig::daily(5),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            request_timeout: Duration::from_secs(5),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }
}

impl AuthConfig {
    /// Create config with random token secrets and OTP salt (for development)
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let fill = |len: usize| {
            let mut buf = vec![0u8; len];
            rand::rng().fill_bytes(&mut buf);
            buf
        };
        Self {
            access_secret: fill(32),
            refresh_secret: fill(32),
            otp_salt: fill(16),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    pub fn access_ttl_ms(&self) -> i64 {
        self.access_ttl.as_millis() as i64
    }

    pub fn refresh_ttl_ms(&self) -> i64 {
        self.refresh_ttl.as_millis() as i64
    }

    pub fn rotation_threshold_ms(&self) -> i64 {
        self.rotation_threshold.as_millis() as i64
    }

    pub fn otp_ttl_ms(&self) -> i64 {
        self.otp_ttl.as_millis() as i64
    }

    pub fn reset_ttl_ms(&self) -> i64 {
        self.reset_ttl.as_millis() as i64
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn otp_salt(&self) -> Option<&[u8]> {
        if self.otp_salt.is_empty() {
            None
        } else {
            Some(&self.otp_salt)
        }
    }

    pub fn access_cookie(&self) -> CookieConfig {
        CookieConfig::http_only(
            ACCESS_COOKIE_NAME,
            self.access_ttl.as_secs() as i64,
            self.cookie_secure,
            self.cookie_same_site,
        )
    }

    pub fn refresh_cookie(&self) -> CookieConfig {
        CookieConfig::http_only(
            REFRESH_COOKIE_NAME,
            self.refresh_ttl.as_secs() as i64,
            self.cookie_secure,
            self.cookie_same_site,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.access_ttl_ms(), 15 * 60 * 1000);
        assert_eq!(config.refresh_ttl_ms(), 7 * 24 * 3600 * 1000);
        assert_eq!(config.rotation_threshold_ms(), 2 * 3600 * 1000);
        assert_eq!(config.otp_ttl_ms(), 5 * 60 * 1000);
        assert_eq!(config.otp_limit.max_requests, 5);
        assert_eq!(config.reset_limit.max_requests, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.otp_salt().is_none());
    }

    #[test]
    fn test_random_secrets_are_distinct() {
        let config = AuthConfig::development();
        assert_eq!(config.access_secret.len(), 32);
        assert_ne!(config.access_secret, config.refresh_secret);
        assert!(!config.cookie_secure);
        assert!(config.otp_salt().is_some());
    }

    #[test]
    fn test_cookie_configs() {
        let config = AuthConfig::default();
        let access = config.access_cookie();
        assert_eq!(access.name, "access_token");
        assert!(access.http_only);
        assert_eq!(access.max_age_secs, Some(900));
        assert_eq!(config.refresh_cookie().name, "refresh_token");
    }
}
