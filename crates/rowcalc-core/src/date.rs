//! Date normalization
//!
//! Dates are exchanged as Excel serial numbers: days since 1899-12-30, with
//! the fractional part as the time of day. Everything here works in UTC.
//!
//! [`parse_date`] accepts the representations found in imported data:
//! - Excel serials, as numbers or as 5-digit strings
//! - millisecond timestamps
//! - `DD/MM/YYYY` (and `MM/DD/YYYY` when the day is unambiguous)
//! - ISO 8601 and RFC 2822 text

use crate::error::{Error, Result};
use crate::number::leading_float;
use crate::value::Value;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_regex::regex_is_match;
use std::fmt;
use std::str::FromStr;

/// Days between 1899-12-30 and 1970-01-01
pub const EXCEL_UNIX_EPOCH_DAYS: f64 = 25569.0;

/// Milliseconds in one day
pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Numbers strictly between 0 and this bound are read as Excel serials
const EXCEL_SERIAL_LIMIT: f64 = 100_000.0;

/// ECMAScript time value range, in milliseconds
const MAX_TIMESTAMP_MS: f64 = 8.64e15;

/// Placeholder strings that mean "no date"
const EMPTY_MARKERS: [&str; 4] = ["-", "(Vide)", "null", "undefined"];

/// Convert an Excel serial to a UTC date-time
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - EXCEL_UNIX_EPOCH_DAYS) * MS_PER_DAY + 0.5).floor();
    from_timestamp_millis(millis)
}

/// Convert a UTC date-time to an Excel serial
pub fn to_excel_serial(dt: &NaiveDateTime) -> f64 {
    dt.and_utc().timestamp_millis() as f64 / MS_PER_DAY + EXCEL_UNIX_EPOCH_DAYS
}

fn from_timestamp_millis(millis: f64) -> Option<NaiveDateTime> {
    if !millis.is_finite() || millis.abs() > MAX_TIMESTAMP_MS {
        return None;
    }
    DateTime::from_timestamp_millis(millis.trunc() as i64).map(|dt| dt.naive_utc())
}

/// Build a calendar date, rolling over out-of-range months and days.
///
/// Month 13 is January of the next year, day 0 is the last day of the
/// previous month, and so on.
pub fn ymd_rollover(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    // Anything further out than this is beyond chrono's range anyway
    const LIMIT: i64 = 4_000_000;
    if year.abs() > LIMIT || month.abs() > LIMIT * 12 || day.abs() > LIMIT * 366 {
        return None;
    }

    let months = year * 12 + (month - 1);
    let y = i32::try_from(months.div_euclid(12)).ok()?;
    let m = months.rem_euclid(12) as u32 + 1;
    let first = NaiveDate::from_ymd_opt(y, m, 1)?;

    let offset = day - 1;
    if offset >= 0 {
        first.checked_add_days(Days::new(offset as u64))
    } else {
        first.checked_sub_days(Days::new(offset.unsigned_abs()))
    }
}

/// Excel serial for UTC midnight of the given (rolled-over) date
pub fn excel_serial_from_ymd(year: i64, month: i64, day: i64) -> Option<f64> {
    ymd_rollover(year, month, day).map(|d| to_excel_serial(&d.and_time(NaiveTime::MIN)))
}

/// Parse a value as a date.
///
/// Returns `None` for null, empty and placeholder values, for anything whose
/// numeric reading is exactly zero, and for unrecognised text.
///
/// # Example
/// ```rust
/// use chrono::Datelike;
/// use rowcalc_core::{parse_date, Value};
///
/// let d = parse_date(&Value::Number(46057.0)).unwrap();
/// assert_eq!((d.year(), d.month(), d.day()), (2026, 2, 4));
///
/// let d = parse_date(&Value::text("15/01/2025")).unwrap();
/// assert_eq!((d.year(), d.month(), d.day()), (2025, 1, 15));
/// ```
pub fn parse_date(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Null | Value::Boolean(_) => None,
        Value::Date(serial) => {
            if *serial == 0.0 {
                None
            } else {
                from_excel_serial(*serial)
            }
        }
        Value::Number(n) => parse_date_number(*n),
        Value::Text(s) => parse_date_str(s),
    }
}

fn parse_date_number(n: f64) -> Option<NaiveDateTime> {
    if !n.is_finite() || n == 0.0 {
        return None;
    }
    if n > 0.0 && n < EXCEL_SERIAL_LIMIT {
        from_excel_serial(n)
    } else {
        from_timestamp_millis(n)
    }
}

/// Parse date text; see [`parse_date`]
pub fn parse_date_str(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() || EMPTY_MARKERS.contains(&s) {
        return None;
    }

    // "0", "0,00", "0.0" all mean "no date"
    if leading_float(&s.replacen(',', ".", 1)) == Some(0.0) {
        return None;
    }

    if regex_is_match!(r"^\d{5}(\.\d+)?$", s) {
        if let Ok(serial) = s.parse::<f64>() {
            if serial > 0.0 && serial < EXCEL_SERIAL_LIMIT {
                return from_excel_serial(serial);
            }
        }
    }

    if s.contains('/') {
        if let Some(date) = parse_slash_date(s) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    parse_native(s)
}

/// `A/B/C` with day-first as the tie-breaker
fn parse_slash_date(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let a = leading_int(parts[0])?;
    let b = leading_int(parts[1])?;
    let c = leading_int(parts[2])?;

    let year = if c < 100 { 2000 + c } else { c };
    let (day, month) = if a > 12 {
        (a, b)
    } else if b > 12 {
        (b, a)
    } else {
        // Ambiguous: French order
        (a, b)
    };
    ymd_rollover(year, month, day)
}

/// Leading integer of `s`, skipping leading whitespace
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse().ok()
}

const NATIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// ISO 8601 / RFC 3339 / RFC 2822 fallback
fn parse_native(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for pattern in NATIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    if regex_is_match!(r"^\d{4}-\d{2}$", s) {
        if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    if regex_is_match!(r"^\d{4}$", s) {
        let year: i32 = s.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).map(|d| d.and_time(NaiveTime::MIN));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }
    None
}

/// Date bucketing used for grouped labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Grouping {
    /// Keep the original label
    #[default]
    None,
    /// `YYYY`
    Year,
    /// `YYYY-T{1..4}`
    Quarter,
    /// `YYYY-MM`
    Month,
}

impl FromStr for Grouping {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Grouping::None),
            "year" => Ok(Grouping::Year),
            "quarter" => Ok(Grouping::Quarter),
            "month" => Ok(Grouping::Month),
            _ => Err(Error::UnknownGrouping(s.to_string())),
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Grouping::None => "none",
            Grouping::Year => "year",
            Grouping::Quarter => "quarter",
            Grouping::Month => "month",
        };
        f.write_str(name)
    }
}

/// Label of the year/quarter/month bucket a date string falls into.
///
/// Unparsable input, `(Vide)` and [`Grouping::None`] return the input unchanged.
pub fn grouped_label(label: &str, grouping: Grouping) -> String {
    if label.is_empty() || label == "(Vide)" || grouping == Grouping::None {
        return label.to_string();
    }
    match parse_date_str(label) {
        Some(dt) => label_for(&dt, grouping),
        None => label.to_string(),
    }
}

pub(crate) fn label_for(dt: &NaiveDateTime, grouping: Grouping) -> String {
    match grouping {
        Grouping::None => dt.format("%Y-%m-%d").to_string(),
        Grouping::Year => format!("{:04}", dt.year()),
        Grouping::Quarter => format!("{:04}-T{}", dt.year(), dt.month0() / 3 + 1),
        Grouping::Month => format!("{:04}-{:02}", dt.year(), dt.month()),
    }
}
