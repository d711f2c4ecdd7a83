//! Timestamp parsing for both families of feed date serializations.
//!
//! A date that fails to parse is treated as absent; the normalizer falls
//! back to ingestion time. Nothing here is allowed to fail a source.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Accepts RFC 2822 (RSS `pubDate`) and RFC 3339/ISO-8601 (Atom), plus a
/// couple of lenient fallbacks for feeds that drop the timezone.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    None
}
