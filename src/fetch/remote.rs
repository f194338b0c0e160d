//! HTTP bridge to the external scraping backend.
//!
//! Scraping the job boards themselves lives in a separate backend
//! service; this fetcher posts the query and provider subset to that
//! service and decodes the raw records it returns. HTTP status codes
//! are mapped to [`FailureKind`] so the engine never inspects error
//! text.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SearchError;
use crate::types::{Provider, RawJob, SearchQuery};

use super::{FailureKind, FetchFailure, ProviderFetch};

/// Region sent when the caller supplied no location.
const DEFAULT_LOCATION: &str = "USA";

/// Wire request for the scraping backend.
#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    site_name: Vec<&'static str>,
    search_term: &'a str,
    location: &'a str,
    results_wanted: usize,
    hours_old: u32,
}

/// Wire response from the scraping backend.
#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    jobs: Vec<RawJob>,
}

/// [`ProviderFetch`] implementation backed by the scraping service.
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
    endpoint: Url,
}

impl RemoteFetcher {
    /// Build a fetcher for the backend at `base_url`.
    ///
    /// The per-request timeout bounds each fetch so one hanging
    /// upstream cannot stall an aggregation attempt.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] when the URL is invalid or the
    /// HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SearchError> {
        let base = Url::parse(base_url)
            .map_err(|e| SearchError::Config(format!("invalid backend URL: {e}")))?;
        let endpoint = base
            .join("scrape")
            .map_err(|e| SearchError::Config(format!("invalid backend URL: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }
}

impl ProviderFetch for RemoteFetcher {
    async fn fetch(
        &self,
        providers: &[Provider],
        query: &SearchQuery,
        results_wanted: usize,
        max_age_hours: u32,
    ) -> Result<Vec<RawJob>, FetchFailure> {
        let location = if query.location().is_empty() {
            DEFAULT_LOCATION
        } else {
            query.location()
        };
        let body = ScrapeRequest {
            site_name: providers.iter().map(Provider::name).collect(),
            search_term: query.term(),
            location,
            results_wanted,
            hours_old: max_age_hours,
        };

        tracing::trace!(term = query.term(), sites = ?body.site_name, "dispatching scrape request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                FetchFailure::transient(format!("scrape request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure {
                kind: classify_status(status),
                message: format!("scrape backend returned {status}"),
            });
        }

        let decoded: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| FetchFailure::fatal(format!("undecodable scrape response: {e}")))?;

        tracing::debug!(count = decoded.jobs.len(), "scrape backend returned records");
        Ok(decoded.jobs)
    }
}

/// Map a non-success HTTP status to a failure classification.
fn classify_status(status: StatusCode) -> FailureKind {
    if status == StatusCode::TOO_MANY_REQUESTS {
        FailureKind::RateLimited
    } else if status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
        FailureKind::Transient
    } else {
        FailureKind::Fatal
    }
}
