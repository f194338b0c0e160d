//! # jobscout
//!
//! Resilient multi-provider job search aggregation.
//!
//! This crate sits between an incoming search request and a set of
//! unreliable upstream job boards. Given a query it returns a
//! deduplicated, paginated result set while shielding callers from
//! upstream rate limiting, transient failures, and redundant work.
//! It compiles into the serving binary as a library dependency; HTTP
//! routing is a thin layer on top and lives elsewhere.
//!
//! ## Design
//!
//! - Providers are classified into priority tiers (primary, secondary,
//!   backup) with per-provider cooldown and penalty windows
//! - Aggregation runs bounded retry attempts against escalating
//!   provider subsets, with jitter and exponential backoff
//! - Results are cached by normalised-query fingerprint with a TTL
//! - Concurrent identical queries collapse into one upstream fetch
//! - Graceful degradation: when every attempt fails, callers get an
//!   explicit "temporarily unavailable" outcome with a retry hint,
//!   never an indefinite block
//!
//! ## Security
//!
//! - No API keys or secrets to leak
//! - No network listeners — this is a library, not a server
//! - Search queries are logged only at trace level

pub mod cache;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod registry;
pub mod types;

pub use config::AggregatorConfig;
pub use error::{Result, SearchError};
pub use fetch::{FailureKind, FetchFailure, ProviderFetch, RemoteFetcher};
pub use orchestrator::aggregate::Aggregator;
pub use types::{
    HealthReport, NormalizedJob, Provider, RawJob, SearchOutcome, SearchQuery, SearchResponse,
    Tier,
};

/// Build an aggregator backed by the scraping service at `backend_url`,
/// with default configuration.
///
/// # Errors
///
/// Returns [`SearchError::Config`] when the URL is invalid.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> jobscout::Result<()> {
/// let aggregator = jobscout::with_remote_backend("http://localhost:8000/")?;
/// let query = jobscout::SearchQuery::new("rust engineer", "remote")?;
/// match aggregator.search(&query, 1).await? {
///     jobscout::SearchOutcome::Page(page) => {
///         for job in &page.jobs {
///             println!("{} at {} ({})", job.title, job.company, job.source);
///         }
///     }
///     jobscout::SearchOutcome::Unavailable { retry_after, .. } => {
///         println!("providers unavailable, retry in {retry_after}s");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn with_remote_backend(backend_url: &str) -> Result<Aggregator<RemoteFetcher>> {
    let config = AggregatorConfig::default();
    let fetcher = RemoteFetcher::new(
        backend_url,
        std::time::Duration::from_secs(config.fetch_timeout_secs),
    )?;
    Aggregator::new(config, fetcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_remote_backend_validates_url() {
        assert!(with_remote_backend("not a url").is_err());
        assert!(with_remote_backend("http://localhost:8000/").is_ok());
    }

    #[test]
    fn invalid_query_surfaces_immediately() {
        let err = SearchQuery::new("", "anywhere").unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }
}
