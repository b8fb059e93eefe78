//! Date functions
//!
//! Dates come in through the date normalizer and go out as
//! [`Value::Date`] serials. Everything is UTC.

use super::{arg, number_arg, text_arg};
use crate::evaluator::EvaluationContext;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use rowcalc_core::{excel_serial_from_ymd, to_excel_serial, ymd_rollover, Value};

const MS_PER_DAY: i64 = 86_400_000;

fn date_arg(args: &[Value], index: usize, ctx: &EvaluationContext) -> Option<NaiveDateTime> {
    ctx.normalizer.date(arg(args, index))
}

/// ANNEE/YEAR, 0 for non-dates
pub fn fn_year(args: &[Value], ctx: &EvaluationContext) -> Value {
    let year = date_arg(args, 0, ctx).map_or(0, |d| d.year());
    Value::Number(year as f64)
}

/// MOIS/MONTH (1-12), 0 for non-dates
pub fn fn_month(args: &[Value], ctx: &EvaluationContext) -> Value {
    let month = date_arg(args, 0, ctx).map_or(0, |d| d.month());
    Value::Number(month as f64)
}

/// JOUR/DAY, 0 for non-dates
pub fn fn_day(args: &[Value], ctx: &EvaluationContext) -> Value {
    let day = date_arg(args, 0, ctx).map_or(0, |d| d.day());
    Value::Number(day as f64)
}

/// DATE(year, month, day) at UTC midnight
///
/// Parts are truncated, months and days roll over, and years 0-99 are
/// read as 1900-1999.
pub fn fn_date(args: &[Value], ctx: &EvaluationContext) -> Value {
    let parts = [
        number_arg(args, 0, ctx),
        number_arg(args, 1, ctx),
        number_arg(args, 2, ctx),
    ];
    if parts.iter().any(|p| !p.is_finite()) {
        return Value::Null;
    }
    let [year, month, day] = parts.map(|p| p.trunc() as i64);
    let year = if (0..=99).contains(&year) {
        1900 + year
    } else {
        year
    };

    excel_serial_from_ymd(year, month, day).map_or(Value::Null, Value::Date)
}

/// AUJOURDHUI/TODAY at UTC midnight
pub fn fn_today(_args: &[Value], ctx: &EvaluationContext) -> Value {
    let today = ctx.clock.today().and_time(NaiveTime::MIN);
    Value::Date(to_excel_serial(&today))
}

/// DATEDIF(start, end, unit)
///
/// Units (case-insensitive): `d`/`j` days, `m` months, `y`/`a` years,
/// `md` days ignoring months and years, `ym` months ignoring years,
/// `yd` days ignoring years. Never negative; unparsable dates and unknown
/// units give 0.
pub fn fn_datedif(args: &[Value], ctx: &EvaluationContext) -> Value {
    let (start, end) = match (date_arg(args, 0, ctx), date_arg(args, 1, ctx)) {
        (Some(start), Some(end)) => (start, end),
        _ => return Value::Number(0.0),
    };
    let unit = text_arg(args, 2).to_lowercase();

    let diff = date_difference(&start, &end, &unit).unwrap_or_else(|| {
        log::debug!("unknown DATEDIF unit {:?}", unit);
        0
    });
    Value::Number(diff.max(0) as f64)
}

/// Whole months from `start` to `end`, counting a month only once its day is reached
fn whole_months(start: &NaiveDateTime, end: &NaiveDateTime) -> i64 {
    let months = (end.year() as i64 - start.year() as i64) * 12
        + (end.month() as i64 - start.month() as i64);
    if end.day() < start.day() {
        months - 1
    } else {
        months
    }
}

fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

fn date_difference(start: &NaiveDateTime, end: &NaiveDateTime, unit: &str) -> Option<i64> {
    let diff = match unit {
        "d" | "j" => (*end - *start).num_milliseconds().div_euclid(MS_PER_DAY),
        "m" => whole_months(start, end),
        "y" | "a" => {
            let years = end.year() as i64 - start.year() as i64;
            if (end.month(), end.day()) < (start.month(), start.day()) {
                years - 1
            } else {
                years
            }
        }
        "md" => {
            let days = end.day() as i64 - start.day() as i64;
            if days >= 0 {
                days
            } else {
                // Borrow the length of the month before end's month
                let last_of_previous = ymd_rollover(end.year() as i64, end.month() as i64, 0)?;
                days + last_of_previous.day() as i64
            }
        }
        "ym" => {
            if end < start {
                0
            } else {
                whole_months(start, end).rem_euclid(12)
            }
        }
        "yd" => {
            let end_date = end.date();
            let moved = |year: i64| {
                ymd_rollover(year, start.month() as i64, start.day() as i64)
            };
            let mut anniversary = moved(end.year() as i64)?;
            if anniversary > end_date {
                anniversary = moved(end.year() as i64 - 1)?;
            }
            days_between(anniversary, end_date)
        }
        _ => return None,
    };
    Some(diff)
}
