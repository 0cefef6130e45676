//! Text formats for timestamps as they appear in persisted tables and in
//! source responses.

use chrono::{NaiveDate, NaiveDateTime};

/// Canonical `dt` format for every persisted table.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse a timestamp with second or minute precision, or a bare date
/// (taken as midnight). Runs of whitespace between date and time are allowed.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = joined.as_str();
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
