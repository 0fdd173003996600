//! Application Configuration
//!
//! Configuration for the Blog application layer.

use std::time::Duration;

/// Blog application configuration
#[derive(Debug, Clone)]
pub struct BlogConfig {
    /// Page size when the caller gives none
    pub default_page_size: u64,
    /// Upper bound on requested page sizes
    pub max_page_size: u64,
    /// Listing cache time-to-live (60 seconds)
    pub listing_cache_ttl: Duration,
    /// Deadline applied to every use case
    pub request_timeout: Duration,
    /// Deadline for generation calls, which are slower than the database
    pub ai_timeout: Duration,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            listing_cache_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(5),
            ai_timeout: Duration::from_secs(30),
        }
    }
}

impl BlogConfig {
    /// No listing cache, so writes are visible immediately
    pub fn development() -> Self {
        Self {
            listing_cache_ttl: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn listing_cache_ttl_ms(&self) -> i64 {
        self.listing_cache_ttl.as_millis() as i64
    }

    /// Clamp a requested page size into `1..=max_page_size`
    pub fn page_size(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}
