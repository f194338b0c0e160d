//! The external provider-fetch seam.
//!
//! The aggregation engine never talks to job boards itself; it hands a
//! provider subset and a query to a [`ProviderFetch`] collaborator and
//! interprets the typed outcome. Failures carry a [`FailureKind`] so
//! the engine classifies rate limiting without sniffing error strings.

use std::fmt;

use crate::types::{Provider, RawJob, SearchQuery};

pub mod remote;

pub use remote::RemoteFetcher;

/// Classification of a failed fetch, driving the retry protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The upstream signalled rate limiting (HTTP 429 class). The
    /// engine penalises every provider in the dispatched subset.
    RateLimited,
    /// Network failure, timeout, or a generic upstream error. Retried
    /// within the attempt bound.
    Transient,
    /// Malformed request or response. Retried within the attempt bound
    /// like transient failures, but never penalises providers.
    Fatal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RateLimited => "rate-limited",
            Self::Transient => "transient",
            Self::Fatal => "fatal",
        })
    }
}

/// A failed provider fetch.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} fetch failure: {message}")]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchFailure {
    /// A rate-limit-class failure.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::RateLimited,
            message: message.into(),
        }
    }

    /// A transient upstream failure.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    /// A non-retryable request/response shape failure.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fatal,
            message: message.into(),
        }
    }

    /// Whether this failure should trigger provider penalties.
    pub fn is_rate_limited(&self) -> bool {
        self.kind == FailureKind::RateLimited
    }
}

/// A pluggable multi-provider fetch backend.
///
/// Implementors fetch raw job records from the given provider subset in
/// one call — fan-out across the subset is the collaborator's concern,
/// not the engine's. All implementations must be `Send + Sync` so the
/// engine can serve concurrent requests.
pub trait ProviderFetch: Send + Sync {
    /// Fetch raw records for `query` from `providers`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchFailure`] whose [`FailureKind`] tells the engine
    /// how to react. An `Ok` with an empty list is a valid outcome and
    /// counts as an unsuccessful attempt, not a failure.
    fn fetch(
        &self,
        providers: &[Provider],
        query: &SearchQuery,
        results_wanted: usize,
        max_age_hours: u32,
    ) -> impl std::future::Future<Output = Result<Vec<RawJob>, FetchFailure>> + Send;
}
