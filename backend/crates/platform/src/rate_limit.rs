//! Rate Limiting Infrastructure
//!
//! Fixed-window counters. The counter and the window start live on the
//! throttled record itself (OTP, reset token); this module only decides.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// `max_requests` per 24 hours
    pub fn daily(max_requests: u32) -> Self {
        Self::new(max_requests, 24 * 60 * 60)
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }

    /// Decide what to do with a request given the current counter and the
    /// instant its window opened.
    pub fn check(&self, count: u32, window_start: DateTime<Utc>, now: DateTime<Utc>) -> WindowDecision {
        let elapsed_ms = (now - window_start).num_milliseconds();

        if elapsed_ms >= self.window_ms() {
            WindowDecision::Reset
        } else if count >= self.max_requests {
            let retry_after_ms = self.window_ms() - elapsed_ms;
            WindowDecision::Deny { retry_after_ms }
        } else {
            WindowDecision::Allow {
                remaining: self.max_requests - count,
            }
        }
    }
}

/// Outcome of a fixed-window check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// Still inside the window with budget left
    Allow { remaining: u32 },
    /// The window has elapsed; restart it with a zero counter
    Reset,
    /// Budget exhausted inside the window
    Deny { retry_after_ms: i64 },
}

impl WindowDecision {
    pub fn is_denied(&self) -> bool {
        matches!(self, WindowDecision::Deny { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_allow_under_budget() {
        let config = RateLimitConfig::daily(5);
        let now = Utc::now();
        assert_eq!(
            config.check(3, now - ChronoDuration::hours(1), now),
            WindowDecision::Allow { remaining: 2 }
        );
    }

    #[test]
    fn test_deny_when_exhausted_inside_window() {
        let config = RateLimitConfig::daily(5);
        let now = Utc::now();
        let decision = config.check(5, now - ChronoDuration::hours(23), now);
        assert!(decision.is_denied());
        assert_eq!(
            decision,
            WindowDecision::Deny {
                retry_after_ms: ChronoDuration::hours(1).num_milliseconds()
            }
        );
    }

    #[test]
    fn test_reset_after_window() {
        let config = RateLimitConfig::daily(5);
        let now = Utc::now();
        assert_eq!(
            config.check(5, now - ChronoDuration::hours(24), now),
            WindowDecision::Reset
        );
        assert_eq!(
            config.check(1, now - ChronoDuration::days(3), now),
            WindowDecision::Reset
        );
    }
}
