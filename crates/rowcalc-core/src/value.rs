//! Row value types

use crate::error::{Error, Result};
use ahash::AHashMap;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::str::FromStr;

/// A dynamically-typed scalar read from a row or produced by a formula
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
    /// Boolean value
    Boolean(bool),
    /// Date as an Excel serial (days since 1899-12-30, fraction = time of day)
    Date(f64),
    /// Absent value
    Null,
}

impl Value {
    /// Create a new text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        Value::Text(s.into())
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric payload of a number or date, without any text parsing
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) | Value::Date(n) => Some(*n),
            _ => None,
        }
    }

    /// Text payload, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by IF and boolean output coercion.
    ///
    /// Null, zero, NaN, empty text and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) | Value::Date(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
        }
    }

    /// Convert to display text; null becomes the empty string
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::Boolean(true) => "true".to_string(),
            Value::Boolean(false) => "false".to_string(),
            Value::Number(n) | Value::Date(n) => format_number(*n),
        }
    }

    /// Name of the variant, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::Null => "null",
        }
    }
}

/// Format a number the way it is shown in text results
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        // Avoid "-0"
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(crate::date::to_excel_serial(&date.and_time(chrono::NaiveTime::MIN)))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::Date(crate::date::to_excel_serial(&dt))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Read access to one data row, keyed by field name.
///
/// Lookups are exact and case-sensitive.
pub trait Row {
    /// Get the value of a field, if present
    fn get(&self, field: &str) -> Option<&Value>;
}

impl<S: BuildHasher> Row for HashMap<String, Value, S> {
    fn get(&self, field: &str) -> Option<&Value> {
        HashMap::get(self, field)
    }
}

impl Row for AHashMap<String, Value> {
    fn get(&self, field: &str) -> Option<&Value> {
        // AHashMap derefs to the std map
        (**self).get(field)
    }
}

impl Row for BTreeMap<String, Value> {
    fn get(&self, field: &str) -> Option<&Value> {
        BTreeMap::get(self, field)
    }
}

/// The empty row
impl Row for () {
    fn get(&self, _field: &str) -> Option<&Value> {
        None
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn get(&self, field: &str) -> Option<&Value> {
        (**self).get(field)
    }
}

/// Caller-requested type of an evaluation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutputKind {
    Number,
    Text,
    Boolean,
    Date,
}

impl OutputKind {
    /// Lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKind::Number => "number",
            OutputKind::Text => "text",
            OutputKind::Boolean => "boolean",
            OutputKind::Date => "date",
        }
    }
}

impl FromStr for OutputKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" | "nombre" => Ok(OutputKind::Number),
            "text" | "texte" => Ok(OutputKind::Text),
            "boolean" | "booleen" => Ok(OutputKind::Boolean),
            "date" => Ok(OutputKind::Date),
            _ => Err(Error::UnknownOutputKind(s.to_string())),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::text("").is_truthy());
        assert!(!Value::Boolean(false).is_truthy());

        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::text("0").is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::Date(46057.0).is_truthy());
    }

    #[test]
    fn test_display_string() {
        assert_eq!(Value::Number(3.0).to_display_string(), "3");
        assert_eq!(Value::Number(0.5).to_display_string(), "0.5");
        assert_eq!(Value::Number(-0.0).to_display_string(), "0");
        assert_eq!(Value::Number(f64::INFINITY).to_display_string(), "Infinity");
        assert_eq!(Value::Boolean(true).to_display_string(), "true");
        assert_eq!(Value::Null.to_display_string(), "");
        assert_eq!(Value::Date(46057.0).to_display_string(), "46057");
    }

    #[test]
    fn test_output_kind_from_str() {
        assert_eq!("number".parse::<OutputKind>().unwrap(), OutputKind::Number);
        assert_eq!("Texte".parse::<OutputKind>().unwrap(), OutputKind::Text);
        assert_eq!(" boolean ".parse::<OutputKind>().unwrap(), OutputKind::Boolean);
        assert_eq!("date".parse::<OutputKind>().unwrap(), OutputKind::Date);
        assert_eq!(
            "currency".parse::<OutputKind>(),
            Err(Error::UnknownOutputKind("currency".into()))
        );
    }

    #[test]
    fn test_row_lookup_is_case_sensitive() {
        let mut row: HashMap<String, Value> = HashMap::new();
        row.insert("Age".into(), Value::Number(20.0));

        assert_eq!(Row::get(&row, "Age"), Some(&Value::Number(20.0)));
        assert_eq!(Row::get(&row, "age"), None);
        assert_eq!(Row::get(&(), "Age"), None);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<f64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::text("x"));
    }
}
