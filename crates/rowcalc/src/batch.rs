//! Batch evaluation over a dataset
//!
//! Runs one formula across many rows, compiling it once.
//!
//! # Example
//!
//! ```rust
//! use rowcalc::prelude::*;
//! use std::collections::HashMap;
//!
//! let engine = FormulaEngine::new();
//! let rows: Vec<HashMap<String, Value>> = (1..=3)
//!     .map(|i| HashMap::from([("Qte".to_string(), Value::from(i))]))
//!     .collect();
//!
//! let (values, stats) = rowcalc::evaluate_rows(&engine, &rows, "[Qte] * 10", None);
//! assert_eq!(values, vec![Value::Number(10.0), Value::Number(20.0), Value::Number(30.0)]);
//! assert_eq!(stats.rows, 3);
//! assert_eq!(stats.nulls, 0);
//! ```

use crate::{FormulaEngine, OutputKind, Row, Value};

/// Statistics from a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Number of rows evaluated
    pub rows: usize,
    /// Number of rows whose result was null
    pub nulls: usize,
}

/// Evaluate `formula` on every row, in order.
///
/// A formula that does not compile yields one null per row.
pub fn evaluate_rows<R: Row>(
    engine: &FormulaEngine,
    rows: &[R],
    formula: &str,
    output: Option<OutputKind>,
) -> (Vec<Value>, BatchStats) {
    let mut stats = BatchStats {
        rows: rows.len(),
        nulls: 0,
    };

    let compiled = if formula.trim().is_empty() {
        None
    } else {
        match engine.compiled(formula) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                log::debug!("formula {:?} evaluated to null for every row: {}", formula, e);
                None
            }
        }
    };

    let values: Vec<Value> = match compiled {
        Some(compiled) => rows
            .iter()
            .map(|row| engine.evaluate_compiled(row, &compiled, output))
            .collect(),
        None => vec![Value::Null; rows.len()],
    };

    stats.nulls = values.iter().filter(|v| v.is_null()).count();
    (values, stats)
}
