//! Integration tests for the HTTP bridge to the scraping backend,
//! using a mock server — no real job boards are contacted.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jobscout::{FailureKind, Provider, ProviderFetch, RemoteFetcher, SearchQuery};

const TIMEOUT: Duration = Duration::from_secs(5);

fn query() -> SearchQuery {
    SearchQuery::new("rust engineer", "berlin").expect("valid query")
}

async fn fetcher_for(server: &MockServer) -> RemoteFetcher {
    RemoteFetcher::new(&server.uri(), TIMEOUT).expect("valid backend URL")
}

#[tokio::test]
async fn decodes_records_from_success_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobs": [
                {
                    "title": "Rust Engineer",
                    "company": "Acme",
                    "job_url": "https://jobs.example.com/1",
                    "site": "indeed",
                    "salary_min": 70000.0
                },
                {
                    "title": "Systems Engineer",
                    "site": "zip_recruiter"
                }
            ]
        })))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let records = fetcher
        .fetch(&[Provider::Indeed, Provider::ZipRecruiter], &query(), 30, 168)
        .await
        .expect("fetch should succeed");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title.as_deref(), Some("Rust Engineer"));
    assert_eq!(records[0].site, Some(Provider::Indeed));
    assert_eq!(records[0].salary_min, Some(70000.0));
    assert_eq!(records[1].site, Some(Provider::ZipRecruiter));
}

#[tokio::test]
async fn sends_query_and_provider_subset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .and(body_partial_json(json!({
            "site_name": ["linkedin", "indeed"],
            "search_term": "rust engineer",
            "location": "berlin",
            "results_wanted": 30,
            "hours_old": 168
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobs": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let records = fetcher
        .fetch(&[Provider::LinkedIn, Provider::Indeed], &query(), 30, 168)
        .await
        .expect("fetch should succeed");
    assert!(records.is_empty());
}

#[tokio::test]
async fn empty_location_falls_back_to_default_region() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .and(body_partial_json(json!({ "location": "USA" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobs": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let no_location = SearchQuery::new("engineer", "").expect("valid query");
    let result = fetcher
        .fetch(&[Provider::Indeed], &no_location, 30, 168)
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn status_429_classified_as_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let failure = fetcher
        .fetch(&[Provider::LinkedIn], &query(), 30, 168)
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::RateLimited);
    assert!(failure.is_rate_limited());
}

#[tokio::test]
async fn server_error_classified_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let failure = fetcher
        .fetch(&[Provider::Indeed], &query(), 30, 168)
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Transient);
}

#[tokio::test]
async fn client_error_classified_as_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let failure = fetcher
        .fetch(&[Provider::Indeed], &query(), 30, 168)
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Fatal);
}

#[tokio::test]
async fn undecodable_body_classified_as_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server).await;
    let failure = fetcher
        .fetch(&[Provider::Indeed], &query(), 30, 168)
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Fatal);
    assert!(failure.to_string().contains("undecodable"));
}

#[tokio::test]
async fn unreachable_backend_classified_as_transient() {
    // Nothing listens on this port.
    let fetcher =
        RemoteFetcher::new("http://127.0.0.1:1/", Duration::from_millis(500)).expect("valid URL");
    let failure = fetcher
        .fetch(&[Provider::Indeed], &query(), 30, 168)
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Transient);
}
