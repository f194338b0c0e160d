//! Core aggregation engine: bounded retry against escalating provider
//! subsets, with cache short-circuiting and cooldown feedback.
//!
//! A request first consults the fingerprint cache; on a live hit no
//! upstream call is made. On a miss the engine runs up to
//! `max_attempts` fetch attempts, widening the provider subset each
//! retry and backing off exponentially in between. Rate-limit failures
//! penalise every provider in the dispatched subset. The first
//! non-empty result wins; exhaustion degrades to an explicit
//! "temporarily unavailable" outcome rather than an error.
//!
//! # Retry state machine
//!
//! ```text
//!              ┌────────────┐  non-empty  ┌─────────┐
//!   (start) ──►│ Attempting ├────────────►│ Success │
//!              └─────┬──────┘             └─────────┘
//!                    │ empty / failure
//!              ┌─────▼──────┐  attempts left   (backoff, widen)
//!              │  Retrying  ├────────────────► Attempting
//!              └─────┬──────┘
//!                    │ attempts exhausted / deadline passed
//!              ┌─────▼──────┐
//!              │ Exhausted  │
//!              └────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::Mutex as AsyncMutex;

use crate::cache::FingerprintCache;
use crate::config::AggregatorConfig;
use crate::cooldown::CooldownTracker;
use crate::error::Result;
use crate::fetch::ProviderFetch;
use crate::types::{
    Fingerprint, HealthReport, NormalizedJob, Provider, RawJob, SearchOutcome, SearchQuery,
    SearchResponse,
};

use super::{dedup, normalize, paginate};

/// Message carried by the degraded outcome.
const UNAVAILABLE_MESSAGE: &str = "No jobs found. All job sites may be temporarily unavailable.";

/// Retry-loop state. Transitions are driven by the collaborator
/// outcome and the attempt count.
enum Phase {
    Attempting { attempt: u32 },
    Retrying { attempt: u32 },
    Success { records: Vec<RawJob> },
    Exhausted,
}

/// The aggregation service.
///
/// Owns the fingerprint cache, the cooldown tracker, and the fetch
/// collaborator; all shared state is internally synchronised, so one
/// instance serves any number of concurrent requests through `&self`.
pub struct Aggregator<F> {
    config: AggregatorConfig,
    cache: FingerprintCache,
    cooldowns: CooldownTracker,
    fetcher: F,
    /// In-flight aggregations keyed by fingerprint. Late arrivals for
    /// the same normalised query queue here instead of issuing a
    /// duplicate upstream fetch, and re-check the cache once the first
    /// flight lands.
    flights: AsyncMutex<HashMap<Fingerprint, Arc<AsyncMutex<()>>>>,
}

impl<F: ProviderFetch> Aggregator<F> {
    /// Build an aggregator from a validated configuration and a fetch
    /// collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`](crate::error::SearchError::Config)
    /// when the configuration is invalid.
    pub fn new(config: AggregatorConfig, fetcher: F) -> Result<Self> {
        config.validate()?;
        let cache = FingerprintCache::new(Duration::from_secs(config.cache_ttl_secs));
        let cooldowns = CooldownTracker::new(Duration::from_secs(config.cooldown_secs));
        Ok(Self {
            config,
            cache,
            cooldowns,
            fetcher,
            flights: AsyncMutex::new(HashMap::new()),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// The fetch collaborator this aggregator dispatches to.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Search for jobs matching `query`, returning page `page`.
    ///
    /// # Errors
    ///
    /// Returns
    /// [`SearchError::Normalization`](crate::error::SearchError::Normalization)
    /// when the upstream payload cannot be coerced into the canonical
    /// shape. Upstream fetch failures never propagate — they are
    /// absorbed by the retry protocol and surface as
    /// [`SearchOutcome::Unavailable`].
    pub async fn search(&self, query: &SearchQuery, page: usize) -> Result<SearchOutcome> {
        self.search_with_deadline(query, page, None).await
    }

    /// Like [`Aggregator::search`], with a caller deadline.
    ///
    /// When the deadline passes mid-aggregation the retry loop aborts
    /// between attempts and the degraded outcome is returned early,
    /// rather than exceeding the caller's patience.
    pub async fn search_with_deadline(
        &self,
        query: &SearchQuery,
        page: usize,
        deadline: Option<Duration>,
    ) -> Result<SearchOutcome> {
        let fingerprint = query.fingerprint();

        if let Some(entry) = self.cache.get(fingerprint, Instant::now()).await {
            tracing::debug!(term = query.term(), "cache hit");
            return Ok(self
                .page_outcome(&entry.jobs, &entry.sources, page, fingerprint)
                .await);
        }

        let flight = self.flight_slot(fingerprint).await;
        let guard = flight.lock().await;

        // An identical in-flight query may have landed while we waited.
        if let Some(entry) = self.cache.get(fingerprint, Instant::now()).await {
            tracing::debug!(term = query.term(), "cache hit after awaiting in-flight query");
            drop(guard);
            self.release_flight(fingerprint, &flight).await;
            return Ok(self
                .page_outcome(&entry.jobs, &entry.sources, page, fingerprint)
                .await);
        }

        tracing::debug!(term = query.term(), location = query.location(), "cache miss, aggregating");
        let result = match self.run_attempts(query, deadline).await {
            Some(records) => self.store_and_page(fingerprint, &records, page).await,
            None => Ok(SearchOutcome::Unavailable {
                message: UNAVAILABLE_MESSAGE.into(),
                retry_after: self.config.retry_after_secs,
            }),
        };

        drop(guard);
        self.release_flight(fingerprint, &flight).await;
        result
    }

    /// Operational snapshot: cache size, per-provider cooldowns, and
    /// the providers available right now.
    pub async fn health(&self) -> HealthReport {
        let now = Instant::now();
        HealthReport {
            cache_size: self.cache.entry_count().await,
            cooldowns: self
                .cooldowns
                .remaining(now)
                .into_iter()
                .map(|(provider, wait)| (provider, wait.as_secs()))
                .collect(),
            available: self
                .cooldowns
                .available_providers(Provider::all().len(), now),
        }
    }

    /// Administrative reset: empties the cache and all cooldown state.
    /// Not part of normal request flow.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        self.cooldowns.reset();
        tracing::debug!("cache and cooldowns cleared");
    }

    /// Drive the retry state machine until success or exhaustion.
    async fn run_attempts(
        &self,
        query: &SearchQuery,
        deadline: Option<Duration>,
    ) -> Option<Vec<RawJob>> {
        let started = tokio::time::Instant::now();
        let mut phase = Phase::Attempting { attempt: 1 };
        loop {
            phase = match phase {
                Phase::Attempting { attempt } => self.attempt(query, attempt).await,
                Phase::Retrying { attempt } => {
                    if attempt >= self.config.max_attempts {
                        Phase::Exhausted
                    } else if deadline.is_some_and(|d| started.elapsed() >= d) {
                        tracing::debug!(attempt, "caller deadline passed, aborting retries");
                        Phase::Exhausted
                    } else {
                        let backoff =
                            Duration::from_millis(self.config.backoff_unit_ms << attempt);
                        tracing::debug!(
                            attempt,
                            backoff_ms = backoff.as_millis() as u64,
                            "backing off before retry"
                        );
                        tokio::time::sleep(backoff).await;
                        Phase::Attempting {
                            attempt: attempt + 1,
                        }
                    }
                }
                Phase::Success { records } => return Some(records),
                Phase::Exhausted => {
                    tracing::warn!(term = query.term(), "all aggregation attempts exhausted");
                    return None;
                }
            };
        }
    }

    /// Run one attempt: select providers (widening with the attempt
    /// number), jitter, fetch with a timeout, classify the outcome.
    async fn attempt(&self, query: &SearchQuery, attempt: u32) -> Phase {
        let breadth = self.config.base_breadth + attempt as usize;
        // Selection marks the subset used before dispatch, so a
        // concurrent request cannot re-select just-dispatched providers.
        let subset = self.cooldowns.select_for_attempt(breadth, Instant::now());
        tracing::debug!(attempt, providers = ?subset, "attempt starting");

        self.jitter().await;

        let fetch = self.fetcher.fetch(
            &subset,
            query,
            self.config.results_wanted,
            self.config.max_age_hours,
        );
        let timeout = Duration::from_secs(self.config.fetch_timeout_secs);

        match tokio::time::timeout(timeout, fetch).await {
            Ok(Ok(records)) if !records.is_empty() => {
                tracing::debug!(attempt, count = records.len(), "attempt succeeded");
                Phase::Success { records }
            }
            Ok(Ok(_)) => {
                tracing::debug!(attempt, "attempt returned no records");
                Phase::Retrying { attempt }
            }
            Ok(Err(failure)) => {
                tracing::warn!(attempt, kind = %failure.kind, error = %failure, "attempt failed");
                if failure.is_rate_limited() {
                    let until = Instant::now() + Duration::from_secs(self.config.penalty_secs);
                    for provider in &subset {
                        self.cooldowns.apply_penalty(*provider, until);
                    }
                }
                Phase::Retrying { attempt }
            }
            Err(_) => {
                tracing::warn!(attempt, timeout_secs = self.config.fetch_timeout_secs, "attempt timed out");
                Phase::Retrying { attempt }
            }
        }
    }

    /// Normalise, dedup, cache, and page a successful fetch.
    async fn store_and_page(
        &self,
        fingerprint: Fingerprint,
        records: &[RawJob],
        page: usize,
    ) -> Result<SearchOutcome> {
        let jobs = dedup::dedup_jobs(normalize::normalize_records(records)?);
        let sources = normalize::contributing_sources(records);
        self.cache
            .insert(fingerprint, jobs.clone(), sources.clone(), Instant::now())
            .await;
        tracing::debug!(count = jobs.len(), sources = ?sources, "result set cached");
        Ok(self.page_outcome(&jobs, &sources, page, fingerprint).await)
    }

    async fn page_outcome(
        &self,
        jobs: &[NormalizedJob],
        sources: &[Provider],
        page: usize,
        fingerprint: Fingerprint,
    ) -> SearchOutcome {
        let expires = self.cache.remaining_ttl(fingerprint, Instant::now()).await;
        let sliced = paginate::paginate(jobs, page, self.config.page_size);
        SearchOutcome::Page(SearchResponse {
            jobs: sliced.items,
            total: sliced.total,
            current_page: page.max(1),
            has_more: sliced.has_more,
            sources: sources.to_vec(),
            cache_expires_in: expires.as_secs(),
        })
    }

    /// Random delay before dispatch, desynchronising bursts of
    /// concurrent requests against the same providers.
    async fn jitter(&self) {
        let (min, max) = self.config.retry_jitter_ms;
        if max == 0 {
            return;
        }
        let delay = rand::thread_rng().gen_range(min..=max);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    async fn flight_slot(&self, fingerprint: Fingerprint) -> Arc<AsyncMutex<()>> {
        let mut flights = self.flights.lock().await;
        flights
            .entry(fingerprint)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Drop the flight slot once no other waiter holds it.
    async fn release_flight(&self, fingerprint: Fingerprint, slot: &Arc<AsyncMutex<()>>) {
        let mut flights = self.flights.lock().await;
        if flights
            .get(&fingerprint)
            .is_some_and(|s| Arc::ptr_eq(s, slot) && Arc::strong_count(s) <= 2)
        {
            flights.remove(&fingerprint);
        }
    }
}
