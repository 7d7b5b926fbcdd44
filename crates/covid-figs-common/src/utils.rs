//! Shared utility functions for naming, time formatting and parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FigsError, Result};

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").expect("static regex is valid"));

/// Timestamp layouts accepted for date columns of the upstream CSV.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Turns a series or area name into a file-name stem.
///
/// Every non-word character becomes `_`, then the result is lower-cased.
pub fn file_slug(name: &str) -> String {
    NON_WORD.replace_all(name, "_").to_lowercase()
}

/// Formats the "data updated" suffix used under chart titles.
pub fn format_update_line<Z: TimeZone>(timestamp: &DateTime<Z>) -> String
where
    Z::Offset: std::fmt::Display,
{
    format!("(dati aggiornati: {})", timestamp.format("%d/%m/%Y %H:%M:%S"))
}

/// Formats a timestamp as RFC 3339 with offset and whole seconds.
pub fn format_iso_seconds<Z: TimeZone>(timestamp: &DateTime<Z>) -> String
where
    Z::Offset: std::fmt::Display,
{
    timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
}

/// Parses a display time zone name such as `Europe/Rome`.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| FigsError::validation_field(format!("Unknown time zone '{name}': {e}"), "timezone"))
}

/// Parses a CSV date cell into a timestamp.
///
/// Plain dates resolve to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Joins an object key prefix and a file name with a single `/`.
pub fn join_key(prefix: &str, file_name: &str) -> String {
    if prefix.is_empty() {
        file_name.to_string()
    } else if prefix.ends_with('/') {
        format!("{prefix}{file_name}")
    } else {
        format!("{prefix}/{file_name}")
    }
}
