//! Converter functions for the wire encoding of calendar dates.
//!
//! The remote collection stores dates as `YYYY-MM-DD` strings. Older records
//! written by browser clients may carry a full timestamp instead
//! (`2024-01-01T00:00:00.000Z` or a naive `2024-01-01T00:00:00`), so decoding
//! accepts those and keeps only the date part. Encoding always produces the
//! short form.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Format used for dates on the wire and in command line arguments.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a wire date, accepting the short form or a full timestamp.
///
/// # Returns
/// * `Result<NaiveDate, String>` - The calendar date or an error message
pub fn parse_wire_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, WIRE_DATE_FORMAT) {
        return Ok(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.date_naive());
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|timestamp| timestamp.date())
        .map_err(|e| format!("Failed to parse date '{}': {}", value, e))
}

/// Formats a date the way the remote collection expects it.
pub fn format_wire_date(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

/// Serde adapter for `NaiveDate` fields, used with `#[serde(with = ...)]`.
pub mod wire_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_wire_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_wire_date(&raw).map_err(D::Error::custom)
    }
}
