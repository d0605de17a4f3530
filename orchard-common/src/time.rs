//! Timestamp utilities
//!
//! All observation timestamps are stored and rendered in UTC.

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Storage form of a timestamp (RFC 3339, millisecond precision)
pub fn to_storage(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse the storage form back into a timestamp
///
/// Also accepts SQLite's `CURRENT_TIMESTAMP` layout (`YYYY-MM-DD HH:MM:SS`),
/// which rows inserted by hand tend to carry.
pub fn from_storage(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Human-readable form used in report titles (`2024-05-01 14:03:22 UTC`)
pub fn format_display(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Date column of the tabular export (`YYYY-MM-DD`)
pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// Time column of the tabular export (`HH:MM:SS`)
pub fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%H:%M:%S").to_string()
}

/// Filesystem-safe stamp for suggested download filenames
pub fn filename_stamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H-%M-%S").to_string()
}
