//! Numeric normalization
//!
//! Turns the numeric text found in imported datasets into `f64`. It handles
//! French (`1 000,50`) and English (`1,000.50`) separators, unit suffixes
//! (`10 k€`) and every kind of whitespace. Parsing is total: anything
//! unparsable is `0`.

use crate::value::Value;
use lazy_regex::regex_is_match;
use regex::Regex;

/// Parse a value as a number, stripping `unit` first when given.
///
/// # Example
/// ```rust
/// use rowcalc_core::{parse_number, Value};
///
/// assert_eq!(parse_number(&Value::text("1.000,50"), None), 1000.5);
/// assert_eq!(parse_number(&Value::text("1,000.50"), None), 1000.5);
/// assert_eq!(parse_number(&Value::text("10 k€"), Some("k€")), 10.0);
/// ```
pub fn parse_number(value: &Value, unit: Option<&str>) -> f64 {
    match value {
        Value::Number(n) | Value::Date(n) => *n,
        Value::Null => 0.0,
        // "true"/"false" carry no digits
        Value::Boolean(_) => 0.0,
        Value::Text(s) => parse_number_str(s, unit),
    }
}

/// Parse numeric text, stripping `unit` first when given
pub fn parse_number_str(text: &str, unit: Option<&str>) -> f64 {
    let unit = unit.filter(|u| !u.is_empty());
    match unit {
        None => parse_number_with(text, None),
        Some(u) => {
            let pattern = unit_pattern(u);
            parse_number_with(text, pattern.as_ref())
        }
    }
}

/// Build the case-insensitive literal matcher used to strip a unit
pub fn unit_pattern(unit: &str) -> Option<Regex> {
    Regex::new(&format!("(?i){}", regex::escape(unit))).ok()
}

/// Shared implementation; `unit` is an already-compiled [`unit_pattern`]
pub(crate) fn parse_number_with(text: &str, unit: Option<&Regex>) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    // Fast path for plain numeric strings
    if unit.is_none() && regex_is_match!(r"^-?\d+(\.\d+)?$", text) {
        return text.parse().unwrap_or(0.0);
    }

    let stripped = match unit {
        Some(re) => re.replacen(text, 1, ""),
        None => text.into(),
    };

    let mut s: String = stripped.chars().filter(|c| !c.is_whitespace()).collect();

    // Locale disambiguation: whichever separator comes last is the decimal one
    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');
    match (last_comma, last_dot) {
        (Some(c), d) if d.map_or(true, |d| c > d) => {
            // French: "1.000,50"
            s = s.replace('.', "").replacen(',', ".", 1);
        }
        (c, Some(d)) if c.map_or(true, |c| d > c) => {
            // English: "1,000.50"
            s = s.replace(',', "");
        }
        _ => {}
    }

    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    leading_float(&cleaned).unwrap_or(0.0)
}

/// Parse the longest leading decimal literal of `s`.
///
/// Accepts leading whitespace, an optional sign, digits with at most one `.`,
/// and an optional exponent. Returns `None` when no digit is found, so
/// `"5-3"` is `Some(5.0)` and `"-"` is `None`.
pub fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when followed by digits
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    let literal = &s[..end];
    // "1." and "-.5" are fine for Rust's parser; a bare "." never gets here
    literal.parse().ok()
}

/// Strict conversion used for comparisons and numeric output coercion.
///
/// Null is `0`, booleans are `0`/`1`, text must be a complete decimal
/// literal (surrounding whitespace allowed, empty text is `0`), otherwise
/// the result is NaN.
pub fn to_number_strict(value: &Value) -> f64 {
    match value {
        Value::Number(n) | Value::Date(n) => *n,
        Value::Null => 0.0,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                0.0
            } else if regex_is_match!(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$", t) {
                t.parse().unwrap_or(f64::NAN)
            } else {
                match t {
                    "Infinity" | "+Infinity" => f64::INFINITY,
                    "-Infinity" => f64::NEG_INFINITY,
                    _ => f64::NAN,
                }
            }
        }
    }
}

/// Half-up rounding to `decimals` places: `floor(x * 10^d + 0.5) / 10^d`
pub fn round_half_up(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor + 0.5).floor() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn num(s: &str) -> f64 {
        parse_number(&Value::text(s), None)
    }

    #[test]
    fn test_already_numeric() {
        assert_eq!(parse_number(&Value::Number(12.5), None), 12.5);
        assert_eq!(parse_number(&Value::Number(12.5), Some("kg")), 12.5);
        assert_eq!(parse_number(&Value::Date(46057.0), None), 46057.0);
        assert_eq!(parse_number(&Value::Null, None), 0.0);
        assert_eq!(parse_number(&Value::Boolean(true), None), 0.0);
    }

    #[test]
    fn test_fast_path() {
        assert_eq!(num("42"), 42.0);
        assert_eq!(num("-3.25"), -3.25);
        assert_eq!(num(""), 0.0);
    }

    #[test]
    fn test_locale_separators() {
        assert_eq!(num("1.000,50"), 1000.5);
        assert_eq!(num("1,000.50"), 1000.5);
        assert_eq!(num("1 000,50"), 1000.5);
        assert_eq!(num("1\u{a0}234,5"), 1234.5);
        assert_eq!(num("12,5"), 12.5);
        assert_eq!(num("2.345.678,9"), 2345678.9);
        // Comma is last, so it is read as the decimal separator
        assert_eq!(num("1,000"), 1.0);
    }

    #[test]
    fn test_units() {
        assert_eq!(parse_number(&Value::text("10 k€"), Some("k€")), 10.0);
        assert_eq!(parse_number(&Value::text("10 K€"), Some("k€")), 10.0);
        assert_eq!(parse_number(&Value::text("3,5 kg"), Some("kg")), 3.5);
        // Unit with regex metacharacters is matched literally
        assert_eq!(parse_number(&Value::text("7 (u)"), Some("(u)")), 7.0);
        // Symbols are stripped anyway when no unit is provided
        assert_eq!(num("15 %"), 15.0);
        assert_eq!(num("€ 1 250,00"), 1250.0);
    }

    #[test]
    fn test_unparsable_is_zero() {
        assert_eq!(num("abc"), 0.0);
        assert_eq!(num("-"), 0.0);
        assert_eq!(num("N/A"), 0.0);
    }

    #[test]
    fn test_leading_prefix() {
        assert_eq!(num("5-3"), 5.0);
        assert_eq!(leading_float("1.2.3"), Some(1.2));
        assert_eq!(leading_float("  -.5x"), Some(-0.5));
        assert_eq!(leading_float("2e3"), Some(2000.0));
        assert_eq!(leading_float("2e"), Some(2.0));
        assert_eq!(leading_float("."), None);
        assert_eq!(leading_float("abc"), None);
    }

    #[test]
    fn test_strict_conversion() {
        assert_eq!(to_number_strict(&Value::text(" 12.5 ")), 12.5);
        assert_eq!(to_number_strict(&Value::text("")), 0.0);
        assert_eq!(to_number_strict(&Value::text("1e3")), 1000.0);
        assert_eq!(to_number_strict(&Value::Boolean(true)), 1.0);
        assert_eq!(to_number_strict(&Value::Null), 0.0);
        assert!(to_number_strict(&Value::text("12,5")).is_nan());
        assert!(to_number_strict(&Value::text("inf")).is_nan());
        assert!(to_number_strict(&Value::text("abc")).is_nan());
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(1.0 / 3.0, 4), 0.3333);
        assert_eq!(round_half_up(2.5, 0), 3.0);
        assert_eq!(round_half_up(-2.5, 0), -2.0);
        assert_eq!(round_half_up(1234.5678, 2), 1234.57);
    }

    proptest! {
        #[test]
        fn prop_french_and_english_agree(int in 0u32..10_000_000, cents in 0u32..100) {
            let english = format!("{}.{:02}", group(int, ','), cents);
            let french = format!("{},{:02}", group(int, '.'), cents);
            prop_assert_eq!(num(&english), num(&french));
        }
    }

    fn group(n: u32, sep: char) -> String {
        let digits = n.to_string();
        let mut out = String::new();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(sep);
            }
            out.push(c);
        }
        out
    }
}
