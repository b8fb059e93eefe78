//! # rowcalc-core
//!
//! Core data types and normalizers for the rowcalc formula engine.
//!
//! This crate provides:
//! - [`Value`] - the dynamically-typed scalar read from rows and returned by formulas
//! - [`Row`] - read access to one data row
//! - [`parse_number`] - locale-tolerant numeric parsing (`1.000,50`, `1,000.50`, `10 k€`)
//! - [`parse_date`] - Excel serials, timestamps, `DD/MM/YYYY` and ISO dates
//! - [`Normalizer`] - memoizing front-end to both parsers
//!
//! ## Example
//!
//! ```rust
//! use rowcalc_core::{parse_number, grouped_label, Grouping, Value};
//!
//! assert_eq!(parse_number(&Value::text("1 234,5"), None), 1234.5);
//! assert_eq!(grouped_label("15/05/2024", Grouping::Quarter), "2024-T2");
//! ```

pub mod date;
pub mod error;
pub mod memo;
pub mod number;
pub mod value;

pub use date::{
    excel_serial_from_ymd, from_excel_serial, grouped_label, parse_date, to_excel_serial,
    ymd_rollover, Grouping,
};
pub use error::{Error, Result};
pub use memo::{Normalizer, DEFAULT_MEMO_CAPACITY};
pub use number::{parse_number, parse_number_str, round_half_up, to_number_strict};
pub use value::{OutputKind, Row, Value};
