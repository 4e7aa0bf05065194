//! Date utility functions
//!
//! This module provides date parsing, formatting, and the range
//! arithmetic the engine relies on when start and end dates move.

use chrono::{Local, Months, NaiveDate};

/// Standard date format used throughout the engine for wire compatibility
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a date string in YYYY-MM-DD format to NaiveDate
///
/// # Arguments
/// * `date_str` - Date string in YYYY-MM-DD format
///
/// # Returns
/// * `Result<NaiveDate, chrono::ParseError>` - Parsed date or parse error
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT)
}

/// Format a NaiveDate to YYYY-MM-DD string
pub fn format_ymd(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Current local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// The date exactly one calendar month after `date`.
///
/// Clamps to the last day of the target month when the source day does
/// not exist there (e.g. Jan 31 -> Feb 28/29).
pub fn one_month_after(date: NaiveDate) -> NaiveDate {
    date.checked_add_months(Months::new(1)).unwrap_or(date)
}

/// Enforce `end >= start` on a date range.
///
/// When the range is inverted the end date is advanced to one month past
/// the start date; the start date is never moved.
pub fn clamp_range(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    if end < start {
        (start, one_month_after(start))
    } else {
        (start, end)
    }
}

/// Days since the Unix epoch, usable as a plain sortable integer.
pub fn epoch_days(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(date);
    (date - epoch).num_days()
}
