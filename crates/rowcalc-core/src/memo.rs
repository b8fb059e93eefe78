//! Memo tables for repeated normalization
//!
//! Datasets repeat the same cell text many times, so parsed numbers, dates,
//! grouped labels and compiled patterns are remembered. Each table is cleared
//! wholesale once it reaches its capacity.

use crate::date::{self, Grouping};
use crate::number;
use crate::value::Value;
use ahash::AHashMap;
use chrono::NaiveDateTime;
use regex::Regex;
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// Default number of entries per memo table
pub const DEFAULT_MEMO_CAPACITY: usize = 10_000;

/// Hash map that clears itself when it reaches `capacity`
#[derive(Debug)]
struct BoundedMemo<K, V> {
    name: &'static str,
    map: RwLock<AHashMap<K, V>>,
    capacity: usize,
}

impl<K: Eq + Hash, V: Clone> BoundedMemo<K, V> {
    fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            map: RwLock::new(AHashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        map.get(key).cloned()
    }

    fn insert(&self, key: K, value: V) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        if map.len() >= self.capacity {
            log::debug!("clearing {} memo ({} entries)", self.name, map.len());
            map.clear();
        }
        map.insert(key, value);
    }

    fn len(&self) -> usize {
        self.map.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn clear(&self) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Memoizing front-end to the number and date normalizers.
///
/// Results are identical to the free functions in [`crate::number`] and
/// [`crate::date`]; only the cost of repeated inputs changes. Safe to share
/// between threads.
#[derive(Debug)]
pub struct Normalizer {
    numbers: BoundedMemo<String, f64>,
    dates: BoundedMemo<String, Option<NaiveDateTime>>,
    labels: BoundedMemo<(Grouping, String), String>,
    units: BoundedMemo<String, Option<Regex>>,
    patterns: BoundedMemo<String, Option<Regex>>,
}

impl Normalizer {
    /// Create a normalizer whose tables hold up to `capacity` entries each
    pub fn new(capacity: usize) -> Self {
        Self {
            numbers: BoundedMemo::new("number", capacity),
            dates: BoundedMemo::new("date", capacity),
            labels: BoundedMemo::new("grouped label", capacity),
            units: BoundedMemo::new("unit pattern", capacity),
            patterns: BoundedMemo::new("replace pattern", capacity),
        }
    }

    /// Memoized [`number::parse_number`]
    pub fn number(&self, value: &Value, unit: Option<&str>) -> f64 {
        let text = match value {
            Value::Text(s) => s,
            other => return number::parse_number(other, unit),
        };

        match unit.filter(|u| !u.is_empty()) {
            None => {
                if let Some(n) = self.numbers.get(text.as_str()) {
                    return n;
                }
                let n = number::parse_number_with(text, None);
                self.numbers.insert(text.clone(), n);
                n
            }
            Some(u) => {
                let key = format!("{u}\u{0}{text}");
                if let Some(n) = self.numbers.get(key.as_str()) {
                    return n;
                }
                let pattern = self.unit_pattern(u);
                let n = number::parse_number_with(text, pattern.as_ref());
                self.numbers.insert(key, n);
                n
            }
        }
    }

    /// Memoized [`date::parse_date`]
    pub fn date(&self, value: &Value) -> Option<NaiveDateTime> {
        let text = match value {
            Value::Text(s) => s,
            other => return date::parse_date(other),
        };
        if let Some(parsed) = self.dates.get(text.as_str()) {
            return parsed;
        }
        let parsed = date::parse_date_str(text);
        self.dates.insert(text.clone(), parsed);
        parsed
    }

    /// Memoized [`date::grouped_label`]
    pub fn grouped_label(&self, label: &str, grouping: Grouping) -> String {
        if grouping == Grouping::None {
            return label.to_string();
        }
        let key = (grouping, label.to_string());
        if let Some(cached) = self.labels.get(&key) {
            return cached;
        }
        let result = date::grouped_label(label, grouping);
        self.labels.insert(key, result.clone());
        result
    }

    /// Compiled regular expression for `source`, or `None` if it is invalid
    pub fn pattern(&self, source: &str) -> Option<Regex> {
        if let Some(cached) = self.patterns.get(source) {
            return cached;
        }
        let compiled = Regex::new(source).ok();
        self.patterns.insert(source.to_string(), compiled.clone());
        compiled
    }

    fn unit_pattern(&self, unit: &str) -> Option<Regex> {
        if let Some(cached) = self.units.get(unit) {
            return cached;
        }
        let compiled = number::unit_pattern(unit);
        self.units.insert(unit.to_string(), compiled.clone());
        compiled
    }

    /// Total number of memoized entries across all tables
    pub fn len(&self) -> usize {
        self.numbers.len()
            + self.dates.len()
            + self.labels.len()
            + self.units.len()
            + self.patterns.len()
    }

    /// Check if every table is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every memoized entry
    pub fn clear(&self) {
        self.numbers.clear();
        self.dates.clear();
        self.labels.clear();
        self.units.clear();
        self.patterns.clear();
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MEMO_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_number_matches_free_function() {
        let norm = Normalizer::default();
        for text in ["1.000,50", "1,000.50", "42", "abc", "10 k€", " 3 "] {
            let v = Value::text(text);
            assert_eq!(norm.number(&v, None), number::parse_number(&v, None));
            // Second call is served from the memo
            assert_eq!(norm.number(&v, None), number::parse_number(&v, None));
        }
        let v = Value::text("10 k€");
        assert_eq!(norm.number(&v, Some("k€")), 10.0);
        assert_eq!(norm.number(&v, Some("k€")), 10.0);
    }

    #[test]
    fn test_memo_clears_at_capacity() {
        let norm = Normalizer::new(2);
        norm.number(&Value::text("1,5"), None);
        norm.number(&Value::text("2,5"), None);
        assert_eq!(norm.len(), 2);
        norm.number(&Value::text("3,5"), None);
        assert_eq!(norm.len(), 1);
        assert_eq!(norm.number(&Value::text("1,5"), None), 1.5);
    }

    #[test]
    fn test_date_memo() {
        let norm = Normalizer::default();
        let v = Value::text("15/01/2025");
        let first = norm.date(&v).unwrap();
        let second = norm.date(&v).unwrap();
        assert_eq!(first, second);
        assert_eq!((first.year(), first.month(), first.day()), (2025, 1, 15));
        assert_eq!(norm.date(&Value::text("garbage")), None);
        assert_eq!(norm.date(&Value::text("garbage")), None);
    }

    #[test]
    fn test_grouped_label_memo() {
        let norm = Normalizer::default();
        assert_eq!(norm.grouped_label("15/05/2024", Grouping::Quarter), "2024-T2");
        assert_eq!(norm.grouped_label("15/05/2024", Grouping::Quarter), "2024-T2");
        assert_eq!(norm.grouped_label("15/05/2024", Grouping::Year), "2024");
    }

    #[test]
    fn test_pattern_memo() {
        let norm = Normalizer::default();
        assert!(norm.pattern("H.l+").is_some());
        assert!(norm.pattern("(").is_none());
        assert!(norm.pattern("(").is_none());
        norm.clear();
        assert!(norm.is_empty());
    }
}
