//! Error types for the jobscout crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Upstream provider failures never appear
//! here — they are absorbed by the aggregation retry protocol and only
//! surface as a degraded (empty) search outcome.

/// Errors that can cross the aggregation core's boundary.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The search query is missing or empty after trimming.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid aggregator configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A raw provider record could not be coerced into the canonical
    /// shape. Treated as a data-shape bug, not a transient condition —
    /// never retried.
    #[error("normalization failed: {0}")]
    Normalization(String),
}

/// Convenience type alias for jobscout results.
pub type Result<T> = std::result::Result<T, SearchError>;
