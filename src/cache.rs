//! In-memory fingerprint cache for aggregated job results.
//!
//! Maps a normalised-query [`Fingerprint`] to the full (unpaginated)
//! result set plus the providers that contributed it. Uses [`moka`] as
//! the bounded store underneath; expiry is additionally checked on read
//! against an explicit `now`, so the TTL semantics are deterministic
//! and testable. Entries are never patched — a stale entry is replaced
//! wholesale by the next successful aggregation.

use std::time::{Duration, Instant};

use moka::future::Cache;

use crate::types::{Fingerprint, NormalizedJob, Provider};

/// Maximum number of cached result sets.
const MAX_CACHE_ENTRIES: u64 = 100;

/// A cached aggregation result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The full, normalised, deduplicated result set.
    pub jobs: Vec<NormalizedJob>,
    /// Providers that contributed to this result set.
    pub sources: Vec<Provider>,
    /// When this entry was created; validity is `now - created_at < TTL`.
    pub created_at: Instant,
}

/// Owned, internally-synchronised cache of aggregation results.
///
/// Only the aggregation engine writes, and only after a fully
/// successful attempt, so `insert` is an unconditional overwrite —
/// last writer wins, no merge semantics.
pub struct FingerprintCache {
    inner: Cache<u64, CacheEntry>,
    ttl: Duration,
}

impl FingerprintCache {
    /// Create a cache whose entries are valid for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self { inner, ttl }
    }

    /// Look up a live entry for the given fingerprint.
    ///
    /// An entry older than the TTL at `now` is treated as a miss and
    /// evicted lazily.
    pub async fn get(&self, fingerprint: Fingerprint, now: Instant) -> Option<CacheEntry> {
        let entry = self.inner.get(&fingerprint.0).await?;
        if now.saturating_duration_since(entry.created_at) < self.ttl {
            Some(entry)
        } else {
            self.inner.invalidate(&fingerprint.0).await;
            None
        }
    }

    /// Store a fresh result set, replacing any previous entry.
    pub async fn insert(
        &self,
        fingerprint: Fingerprint,
        jobs: Vec<NormalizedJob>,
        sources: Vec<Provider>,
        now: Instant,
    ) {
        let entry = CacheEntry {
            jobs,
            sources,
            created_at: now,
        };
        self.inner.insert(fingerprint.0, entry).await;
    }

    /// Seconds of validity left for the given fingerprint at `now`;
    /// zero when absent or expired.
    pub async fn remaining_ttl(&self, fingerprint: Fingerprint, now: Instant) -> Duration {
        match self.inner.get(&fingerprint.0).await {
            Some(entry) => self
                .ttl
                .saturating_sub(now.saturating_duration_since(entry.created_at)),
            None => Duration::ZERO,
        }
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }

    /// Number of live entries.
    pub async fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }
}
