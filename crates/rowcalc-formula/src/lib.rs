//! # rowcalc-formula
//!
//! Formula compiler and row evaluator for rowcalc.
//!
//! This crate provides:
//! - Tokenizing (text → tokens)
//! - Compilation (tokens → expression tree, function names resolved)
//! - Evaluation against one row at a time
//! - Built-in functions with French and English names
//! - An LRU cache of compiled formulas
//!
//! ## Example
//!
//! ```rust
//! use rowcalc_core::Value;
//! use rowcalc_formula::FormulaEngine;
//! use std::collections::HashMap;
//!
//! let engine = FormulaEngine::new();
//! let mut row = HashMap::new();
//! row.insert("Age".to_string(), Value::Number(20.0));
//!
//! let result = engine.evaluate(&row, "SI([Age] > 18, 'Majeur', 'Mineur')", None);
//! assert_eq!(result, Value::text("Majeur"));
//! ```

pub mod cache;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod functions;
pub mod lexer;
pub mod options;
pub mod parser;

pub use cache::{CacheStats, FormulaCache};
pub use engine::FormulaEngine;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    evaluate, Clock, CompiledFormula, EvaluationContext, FixedClock, SystemClock,
};
pub use expr::{BinaryOperator, Expr};
pub use functions::Function;
pub use lexer::{tokenize, Token, TokenKind};
pub use options::EngineOptions;
pub use parser::{compile, compile_formula, MAX_DEPTH};
