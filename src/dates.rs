//! Timestamp parsing and display helpers.
//!
//! Providers disagree on date formats: RFC 3339 (`2024-01-02T10:00:00Z`),
//! numeric offsets without a colon (`2024-01-02T10:00:00+0000`, NYT),
//! space-separated naive times (`2024-01-02 10:00:00`, World News) and plain
//! dates. Everything here is lenient and never panics on bad input.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a provider timestamp into UTC. Returns `None` when the value is not
/// recognizable; callers sort such values last.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(ts.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|naive| naive.and_utc())
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn is_valid_date(raw: &str) -> bool {
    parse_timestamp(raw).is_some()
}

/// Human-readable date for listings, e.g. `Jan 2, 2024`.
pub fn format_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(ts) => ts.format("%b %-d, %Y").to_string(),
        None => crate::constants::INVALID_DATE.to_string(),
    }
}

/// `2024-01-02` -> `20240102`, the form the NYT search API expects.
pub fn compact_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|d| d.format("%Y%m%d").to_string())
}

/// Start of the given day as an ISO-8601 instant in UTC
/// (`2024-01-02T00:00:00.000Z`). Full timestamps are normalized to UTC.
pub fn to_iso_instant(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(|ts| ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}
