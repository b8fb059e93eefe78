//! Evaluation facade
//!
//! [`FormulaEngine`] is the one entry point hosts need: it owns the compiled
//! formula cache, the normalizer memo tables and the clock, and it never
//! reports a formula error through [`FormulaEngine::evaluate`]. A formula
//! that cannot be compiled simply produces [`Value::Null`].

use crate::cache::{CacheStats, FormulaCache};
use crate::error::FormulaResult;
use crate::evaluator::{Clock, CompiledFormula, EvaluationContext, SystemClock};
use crate::options::EngineOptions;
use rowcalc_core::{
    round_half_up, to_excel_serial, to_number_strict, Normalizer, OutputKind, Row, Value,
};
use std::sync::Arc;

/// Compiles, caches and evaluates formulas against data rows.
///
/// The engine is `Send + Sync`; share it across worker threads with an
/// [`Arc`].
///
/// # Example
/// ```rust
/// use rowcalc_core::{OutputKind, Value};
/// use rowcalc_formula::FormulaEngine;
/// use std::collections::HashMap;
///
/// let engine = FormulaEngine::new();
/// let mut row = HashMap::new();
/// row.insert("A".to_string(), Value::Number(10.0));
/// row.insert("B".to_string(), Value::text("4"));
///
/// assert_eq!(engine.evaluate(&row, "[A] / [B]", None), Value::Number(2.5));
/// assert_eq!(engine.evaluate(&row, "1 / 3", None), Value::Number(0.3333));
/// assert_eq!(engine.evaluate(&row, "[A]", Some(OutputKind::Text)), Value::text("10"));
/// assert_eq!(engine.evaluate(&row, "[[invalid", None), Value::Null);
/// ```
#[derive(Debug)]
pub struct FormulaEngine {
    options: EngineOptions,
    cache: FormulaCache,
    normalizer: Normalizer,
    clock: Box<dyn Clock>,
}

impl FormulaEngine {
    /// Create an engine with default options
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Create an engine with custom options
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            cache: FormulaCache::new(options.cache_capacity),
            normalizer: Normalizer::new(options.memo_capacity),
            clock: Box::new(SystemClock),
            options,
        }
    }

    /// Replace the clock used by `TODAY()`
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn cache(&self) -> &FormulaCache {
        &self.cache
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Compiled-formula cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Evaluate `formula` against `row`, coercing to `output` when given.
    ///
    /// Blank formulas and formulas that fail to compile give [`Value::Null`].
    pub fn evaluate(&self, row: &dyn Row, formula: &str, output: Option<OutputKind>) -> Value {
        match self.try_evaluate(row, formula, output) {
            Ok(value) => value,
            Err(e) => {
                log::debug!("formula {:?} evaluated to null: {}", formula, e);
                Value::Null
            }
        }
    }

    /// Like [`evaluate`](Self::evaluate), but compile errors are returned
    pub fn try_evaluate(
        &self,
        row: &dyn Row,
        formula: &str,
        output: Option<OutputKind>,
    ) -> FormulaResult<Value> {
        if formula.trim().is_empty() {
            return Ok(Value::Null);
        }
        let compiled = self.compiled(formula)?;
        Ok(self.evaluate_compiled(row, &compiled, output))
    }

    /// Evaluate an already compiled formula, with output coercion
    pub fn evaluate_compiled(
        &self,
        row: &dyn Row,
        compiled: &CompiledFormula,
        output: Option<OutputKind>,
    ) -> Value {
        let raw = compiled.evaluate(&self.context(row));
        self.coerce_output(raw, output)
    }

    /// Check that `formula` compiles
    pub fn validate(&self, formula: &str) -> FormulaResult<()> {
        self.compiled(formula).map(|_| ())
    }

    /// Compiled form of `formula`, from the cache when possible
    pub fn compiled(&self, formula: &str) -> FormulaResult<Arc<CompiledFormula>> {
        self.cache.get_or_compile(formula, &self.options)
    }

    /// Evaluation context over `row` using this engine's normalizer and clock
    pub fn context<'a>(&'a self, row: &'a dyn Row) -> EvaluationContext<'a> {
        EvaluationContext::new(row, &self.normalizer, self.clock.as_ref())
    }

    /// Apply output coercion to a raw result
    pub fn coerce_output(&self, value: Value, output: Option<OutputKind>) -> Value {
        match output {
            Some(OutputKind::Text) => Value::Text(value.to_display_string()),
            Some(OutputKind::Boolean) => Value::Boolean(value.is_truthy()),
            Some(OutputKind::Number) => self
                .round(to_number_strict(&value))
                .map_or(Value::Null, Value::Number),
            Some(OutputKind::Date) => self
                .normalizer
                .date(&value)
                .map_or(Value::Null, |dt| Value::Date(to_excel_serial(&dt))),
            None => match value {
                Value::Number(n) => self.round(n).map_or(Value::Null, Value::Number),
                Value::Date(serial) => self.round(serial).map_or(Value::Null, Value::Date),
                other => other,
            },
        }
    }

    /// Rounded value, or `None` if it is not finite before or after rounding
    fn round(&self, n: f64) -> Option<f64> {
        if !n.is_finite() {
            return None;
        }
        let rounded = round_half_up(n, self.options.precision);
        rounded.is_finite().then_some(rounded)
    }
}

impl Default for FormulaEngine {
    fn default() -> Self {
        Self::new()
    }
}
