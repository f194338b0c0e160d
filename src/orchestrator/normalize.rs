//! Raw provider records → canonical [`NormalizedJob`] values.
//!
//! Providers disagree wildly about field presence and shape; the
//! normalizer coerces every record into one canonical form with
//! documented sentinels, so nothing optional ever leaks to callers.

use crate::error::SearchError;
use crate::types::{NormalizedJob, Provider, RawJob};

/// Descriptions longer than this are cut and marked with `...`.
const MAX_DESCRIPTION_CHARS: usize = 200;

/// Sentinel for absent text fields.
const MISSING: &str = "N/A";

/// Sentinel for absent descriptions.
const MISSING_DESCRIPTION: &str = "No description available";

/// Normalise a batch of raw records, preserving input order.
///
/// # Errors
///
/// Returns [`SearchError::Normalization`] when a record carries neither
/// a title nor a URL — a data-shape bug in the upstream payload, not a
/// transient condition.
pub fn normalize_records(records: &[RawJob]) -> Result<Vec<NormalizedJob>, SearchError> {
    records.iter().map(normalize_record).collect()
}

/// Providers that contributed at least one record, in first-seen order.
pub fn contributing_sources(records: &[RawJob]) -> Vec<Provider> {
    let mut sources = Vec::new();
    for record in records {
        if let Some(provider) = record.site {
            if !sources.contains(&provider) {
                sources.push(provider);
            }
        }
    }
    sources
}

fn normalize_record(raw: &RawJob) -> Result<NormalizedJob, SearchError> {
    if raw.title.is_none() && raw.job_url.is_none() {
        return Err(SearchError::Normalization(
            "record has neither title nor url".into(),
        ));
    }
    Ok(NormalizedJob {
        title: text_or(&raw.title, MISSING),
        company: text_or(&raw.company, MISSING),
        location: text_or(&raw.location, MISSING),
        salary: format_salary(raw),
        url: text_or(&raw.job_url, ""),
        description: truncate_description(&raw.description),
        date_posted: text_or(&raw.date_posted, MISSING),
        source: raw.site.map_or_else(|| MISSING.into(), |p| p.name().into()),
        job_type: text_or(&raw.job_type, MISSING),
    })
}

/// Salary formatting ladder: explicit range beats open-ended min, beats
/// capped max, beats whatever free-text salary the provider sent.
fn format_salary(raw: &RawJob) -> String {
    match (raw.salary_min, raw.salary_max) {
        (Some(min), Some(max)) => format!("${}-${}", format_amount(min), format_amount(max)),
        (Some(min), None) => format!("${}+", format_amount(min)),
        (None, Some(max)) => format!("Up to ${}", format_amount(max)),
        (None, None) => text_or(&raw.salary, MISSING),
    }
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn truncate_description(raw: &Option<String>) -> String {
    let text = text_or(raw, MISSING_DESCRIPTION);
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(MAX_DESCRIPTION_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn text_or(value: &Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}
