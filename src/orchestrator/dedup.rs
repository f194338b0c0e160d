//! Duplicate-posting removal by canonical job URL.
//!
//! The same posting frequently surfaces through several boards and
//! through the same board with different tracking decorations. Records
//! are keyed by a canonicalised posting URL (tracking parameters
//! stripped, host case-folded, fragment dropped); records without a URL
//! fall back to a title+company key. The first occurrence wins — input
//! order is the providers' relevance order and is preserved.

use std::collections::HashSet;

use url::Url;

use crate::types::NormalizedJob;

/// Tracking query parameters that job boards append to posting links.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "refid",
    "trackingid",
    "trk",
    "src",
];

/// Remove duplicate postings, keeping the first occurrence of each.
pub fn dedup_jobs(jobs: Vec<NormalizedJob>) -> Vec<NormalizedJob> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(jobs.len());
    for job in jobs {
        if seen.insert(dedup_key(&job)) {
            unique.push(job);
        }
    }
    unique
}

fn dedup_key(job: &NormalizedJob) -> String {
    if job.url.is_empty() {
        return format!(
            "{}|{}",
            job.title.to_lowercase(),
            job.company.to_lowercase()
        );
    }
    canonical_url(&job.url)
}

/// Canonicalise a posting URL for comparison.
///
/// Drops the fragment, strips tracking parameters, sorts the remaining
/// query pairs, and removes a trailing slash. A string that does not
/// parse as a URL is compared case-insensitively as-is.
fn canonical_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_lowercase();
    };

    parsed.set_fragment(None);

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| {
            let k = key.to_lowercase();
            !TRACKING_PARAMS.contains(&k.as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    if params.is_empty() {
        parsed.set_query(None);
    } else {
        let qs: String = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&qs));
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(&path[..path.len() - 1]);
    }

    parsed.to_string()
}
