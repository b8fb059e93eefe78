//! # rowcalc
//!
//! An Excel-like formula engine for tabular data.
//!
//! A formula is compiled once and evaluated against each row of a dataset.
//! Rows are plain maps from field name to [`Value`]; formulas reference
//! fields as `[Name]`.
//!
//! ## Features
//!
//! - Arithmetic and comparisons with spreadsheet precedence
//! - Text, math, logical and date functions
//! - French and English function names (`SI`/`IF`, `SOMME`/`SUM`, ...)
//! - Locale-tolerant number parsing (`1.000,50` and `1,000.50`)
//! - Excel serial dates, `DD/MM/YYYY` and ISO dates
//! - Malformed formulas evaluate to null instead of failing
//!
//! ## Example
//!
//! ```rust
//! use rowcalc::prelude::*;
//! use std::collections::HashMap;
//!
//! let engine = FormulaEngine::new();
//!
//! let mut row = HashMap::new();
//! row.insert("Prix".to_string(), Value::text("1 250,50"));
//! row.insert("Qte".to_string(), Value::Number(2.0));
//!
//! assert_eq!(engine.evaluate(&row, "[Prix] * [Qte]", None), Value::Number(2501.0));
//! assert_eq!(
//!     engine.evaluate(&row, "SI([Qte] > 1, 'lot', 'unité')", None),
//!     Value::text("lot")
//! );
//! ```

pub mod batch;
pub mod prelude;

// Re-export batch types
pub use batch::{evaluate_rows, BatchStats};

// Re-export core types
pub use rowcalc_core::{
    excel_serial_from_ymd,
    from_excel_serial,
    grouped_label,
    // Normalizers
    parse_date,
    parse_number,
    round_half_up,
    to_excel_serial,
    to_number_strict,
    Error,
    Grouping,
    Normalizer,
    // Value types
    OutputKind,
    Result,
    Row,
    Value,
};

// Re-export formula types
pub use rowcalc_formula::{
    compile_formula,
    CacheStats,
    Clock,
    CompiledFormula,
    // Engine
    EngineOptions,
    FixedClock,
    FormulaEngine,
    FormulaError,
    FormulaResult,
    Function,
    SystemClock,
};
