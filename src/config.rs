//! Aggregator configuration with sensible defaults.
//!
//! [`AggregatorConfig`] controls cache lifetime, provider cooldowns,
//! retry behaviour, and pagination. The defaults mirror the tuning the
//! upstream providers tolerate in practice.

use crate::error::SearchError;

/// Configuration for the aggregation engine and its components.
///
/// Use [`Default::default()`] for the documented defaults, or construct
/// with field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// How long a cached result set stays valid, in seconds.
    pub cache_ttl_secs: u64,
    /// Minimum idle time before a provider may be reused, in seconds.
    pub cooldown_secs: u64,
    /// Extended cooldown imposed after a rate-limit signal, in seconds.
    pub penalty_secs: u64,
    /// Hard ceiling on aggregation attempts per cache miss.
    pub max_attempts: u32,
    /// Providers asked on the first attempt. Each retry widens the
    /// selection by one, on the assumption that later attempts face a
    /// cooled-down provider landscape.
    pub base_breadth: usize,
    /// How many raw records to request from the backend per fetch.
    pub results_wanted: usize,
    /// Only postings younger than this are requested, in hours.
    pub max_age_hours: u32,
    /// Results per page.
    pub page_size: usize,
    /// Random delay range in milliseconds `(min, max)` inserted before
    /// each fetch, to desynchronise bursts of concurrent requests.
    pub retry_jitter_ms: (u64, u64),
    /// Base unit for exponential backoff between attempts, in
    /// milliseconds. Attempt `n` is followed by `2^n` units.
    pub backoff_unit_ms: u64,
    /// Per-fetch timeout in seconds, so one hanging provider cannot
    /// stall an attempt.
    pub fetch_timeout_secs: u64,
    /// Seconds callers are told to wait after an exhausted search.
    pub retry_after_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 600,
            cooldown_secs: 60,
            penalty_secs: 300,
            max_attempts: 3,
            base_breadth: 2,
            results_wanted: 30,
            max_age_hours: 168,
            page_size: 10,
            retry_jitter_ms: (1000, 3000),
            backoff_unit_ms: 1000,
            fetch_timeout_secs: 8,
            retry_after_secs: 60,
        }
    }
}

impl AggregatorConfig {
    /// Validates this configuration, returning an error if any field is
    /// invalid.
    ///
    /// Checks:
    /// - `max_attempts` must be greater than 0
    /// - `page_size` must be greater than 0
    /// - `base_breadth` must be greater than 0
    /// - `fetch_timeout_secs` must be greater than 0
    /// - `retry_jitter_ms.0` must be <= `retry_jitter_ms.1`
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_attempts == 0 {
            return Err(SearchError::Config(
                "max_attempts must be greater than 0".into(),
            ));
        }
        if self.page_size == 0 {
            return Err(SearchError::Config(
                "page_size must be greater than 0".into(),
            ));
        }
        if self.base_breadth == 0 {
            return Err(SearchError::Config(
                "base_breadth must be greater than 0".into(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(SearchError::Config(
                "fetch_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.retry_jitter_ms.0 > self.retry_jitter_ms.1 {
            return Err(SearchError::Config(
                "retry_jitter_ms min must be <= max".into(),
            ));
        }
        Ok(())
    }
}
