//! Core types for job search queries, providers, and result records.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Upstream job boards that jobscout can aggregate from.
///
/// Each provider belongs to exactly one [`Tier`]; tier order defines
/// selection priority when picking providers for an attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// LinkedIn — largest index, aggressive rate limiting.
    LinkedIn,
    /// Indeed — broad coverage, reliable.
    Indeed,
    /// Google Jobs — aggregated listings.
    Google,
    /// ZipRecruiter — decent US coverage.
    #[serde(rename = "zip_recruiter")]
    ZipRecruiter,
    /// Glassdoor — listings with salary data.
    Glassdoor,
    /// Naukri — Indian market.
    Naukri,
    /// Bayt — Middle East market.
    Bayt,
    /// BDJobs — Bangladesh market.
    Bdjobs,
}

impl Provider {
    /// Returns the wire name of this provider, as the scraping backend
    /// knows it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LinkedIn => "linkedin",
            Self::Indeed => "indeed",
            Self::Google => "google",
            Self::ZipRecruiter => "zip_recruiter",
            Self::Glassdoor => "glassdoor",
            Self::Naukri => "naukri",
            Self::Bayt => "bayt",
            Self::Bdjobs => "bdjobs",
        }
    }

    /// Returns the priority tier this provider is statically assigned to.
    pub fn tier(&self) -> Tier {
        match self {
            Self::LinkedIn | Self::Indeed | Self::Google => Tier::Primary,
            Self::ZipRecruiter | Self::Glassdoor | Self::Naukri => Tier::Secondary,
            Self::Bayt | Self::Bdjobs => Tier::Backup,
        }
    }

    /// Returns all known provider variants.
    pub fn all() -> &'static [Provider] {
        &[
            Self::LinkedIn,
            Self::Indeed,
            Self::Google,
            Self::ZipRecruiter,
            Self::Glassdoor,
            Self::Naukri,
            Self::Bayt,
            Self::Bdjobs,
        ]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Priority class governing provider selection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Tried first on every attempt.
    Primary,
    /// Consulted when the primary tier cannot fill the requested breadth.
    Secondary,
    /// Last resort.
    Backup,
}

/// A validated job search query.
///
/// Immutable once created. The term must be non-empty after trimming;
/// the location may be empty (the backend falls back to a default
/// region). Normalisation (trim + case-fold) happens in
/// [`SearchQuery::fingerprint`] so that equivalent queries share a
/// cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    term: String,
    location: String,
}

impl SearchQuery {
    /// Build a query, validating the search term.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] when the term is empty or
    /// whitespace-only.
    pub fn new(term: &str, location: &str) -> Result<Self, SearchError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(SearchError::InvalidQuery("search term is required".into()));
        }
        Ok(Self {
            term: term.to_string(),
            location: location.trim().to_string(),
        })
    }

    /// The trimmed search term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// The trimmed location, possibly empty.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Deterministic fingerprint of the normalised query.
    ///
    /// Two queries that differ only in case or surrounding whitespace
    /// produce the same fingerprint.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = DefaultHasher::new();
        self.term.to_lowercase().hash(&mut hasher);
        self.location.to_lowercase().hash(&mut hasher);
        Fingerprint(hasher.finish())
    }
}

/// Cache key derived from a normalised [`SearchQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub(crate) u64);

/// A raw job record as returned by an upstream provider.
///
/// Loosely shaped on purpose: every field is optional, and the
/// normalizer is responsible for coercing records into the canonical
/// [`NormalizedJob`] form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub job_url: Option<String>,
    pub description: Option<String>,
    pub date_posted: Option<String>,
    pub site: Option<Provider>,
    pub job_type: Option<String>,
}

/// A cleaned job record in canonical shape.
///
/// No field is ever null: missing values are replaced by documented
/// sentinels during normalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedJob {
    pub title: String,
    pub company: String,
    pub location: String,
    /// Formatted salary, or `"N/A"` when the provider reported none.
    pub salary: String,
    /// Posting URL, or `""` when the provider reported none.
    pub url: String,
    /// Description, truncated to 200 characters with a `...` marker
    /// appended only when truncation occurred.
    pub description: String,
    pub date_posted: String,
    /// Wire name of the provider that returned this record, or `"N/A"`.
    pub source: String,
    pub job_type: String,
}

/// A successful page of search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub jobs: Vec<NormalizedJob>,
    pub total: usize,
    pub current_page: usize,
    pub has_more: bool,
    /// Providers that contributed to the full (unpaginated) result set.
    pub sources: Vec<Provider>,
    /// Seconds until the backing cache entry expires.
    pub cache_expires_in: u64,
}

/// Outcome of a search: a page of results, or an explicit
/// "temporarily unavailable" answer once every attempt is exhausted.
///
/// The unavailable case is a distinguished empty outcome, not an error —
/// callers can tell "no jobs right now, retry later" apart from a hard
/// failure.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    Page(SearchResponse),
    Unavailable {
        message: String,
        /// Suggested seconds to wait before retrying.
        retry_after: u64,
    },
}

/// Operational snapshot for the health surface.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Number of live cache entries.
    pub cache_size: u64,
    /// Seconds until each tracked provider becomes eligible again.
    /// Providers that were never used do not appear.
    pub cooldowns: BTreeMap<Provider, u64>,
    /// Providers eligible right now, in tier priority order.
    pub available: Vec<Provider>,
}
