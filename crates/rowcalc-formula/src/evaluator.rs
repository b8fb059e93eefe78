//! Formula evaluator
//!
//! Walks a compiled [`Expr`] tree against one row. Evaluation is total:
//! every malformed input has already been rejected at compile time, and the
//! numeric and date normalizers never fail.

use crate::expr::{BinaryOperator, Expr};
use crate::functions;
use chrono::NaiveDate;
use rowcalc_core::{to_number_strict, Normalizer, Row, Value};
use std::fmt;

/// Source of the current date for `TODAY()`
pub trait Clock: Send + Sync + fmt::Debug {
    /// Today's date in UTC
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}

/// Clock pinned to one date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

static SYSTEM_CLOCK: SystemClock = SystemClock;

/// Everything a formula can read while it runs
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Row supplying `[Field]` values
    pub row: &'a dyn Row,
    /// Number and date normalizer
    pub normalizer: &'a Normalizer,
    /// Clock for `TODAY()`
    pub clock: &'a dyn Clock,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(row: &'a dyn Row, normalizer: &'a Normalizer, clock: &'a dyn Clock) -> Self {
        Self {
            row,
            normalizer,
            clock,
        }
    }

    /// Create a context that reads the system clock
    pub fn with_system_clock(row: &'a dyn Row, normalizer: &'a Normalizer) -> Self {
        Self::new(row, normalizer, &SYSTEM_CLOCK)
    }

    /// Numeric coercion through the normalizer
    pub fn number(&self, value: &Value) -> f64 {
        self.normalizer.number(value, None)
    }
}

impl fmt::Debug for EvaluationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// A compiled formula, ready to run against any number of rows
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
    root: Expr,
}

impl CompiledFormula {
    pub(crate) fn new(root: Expr) -> Self {
        Self { root }
    }

    /// Root of the expression tree
    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Evaluate against the row in `ctx`, without output coercion
    pub fn evaluate(&self, ctx: &EvaluationContext) -> Value {
        evaluate(&self.root, ctx)
    }
}

/// Evaluate an expression
pub fn evaluate(expr: &Expr, ctx: &EvaluationContext) -> Value {
    match expr {
        Expr::Number(n) => Value::Number(*n),
        Expr::Text(s) => Value::Text(s.clone()),
        Expr::Field(name) => ctx.row.get(name).cloned().unwrap_or(Value::Null),
        Expr::Negate(operand) => {
            let v = evaluate(operand, ctx);
            Value::Number(-ctx.number(&v))
        }
        Expr::Binary { op, left, right } => {
            let l = evaluate(left, ctx);
            let r = evaluate(right, ctx);
            evaluate_binary_op(*op, &l, &r, ctx)
        }
        Expr::Call { function, args } => functions::call(*function, args, ctx),
    }
}

fn evaluate_binary_op(op: BinaryOperator, l: &Value, r: &Value, ctx: &EvaluationContext) -> Value {
    match op {
        // Arithmetic operators
        BinaryOperator::Add => Value::Number(ctx.number(l) + ctx.number(r)),
        BinaryOperator::Subtract => Value::Number(ctx.number(l) - ctx.number(r)),
        BinaryOperator::Multiply => Value::Number(ctx.number(l) * ctx.number(r)),
        BinaryOperator::Divide => {
            let divisor = ctx.number(r);
            if divisor == 0.0 {
                Value::Number(0.0)
            } else {
                Value::Number(ctx.number(l) / divisor)
            }
        }

        // Comparison operators work on the raw values
        BinaryOperator::Equal => Value::Boolean(loose_equals(l, r)),
        BinaryOperator::NotEqual => Value::Boolean(!loose_equals(l, r)),
        BinaryOperator::LessThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEqual => Value::Boolean(loose_compare(op, l, r)),
    }
}

/// Equality on raw values.
///
/// Null only equals Null, two texts compare exactly, anything else compares
/// numerically with text converted strictly.
pub fn loose_equals(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Text(a), Value::Text(b)) => a == b,
        _ => to_number_strict(l) == to_number_strict(r),
    }
}

/// Ordering on raw values.
///
/// Two texts compare lexicographically. Everything else compares as strict
/// numbers, and NaN on either side makes the comparison false.
pub fn loose_compare(op: BinaryOperator, l: &Value, r: &Value) -> bool {
    if let (Value::Text(a), Value::Text(b)) = (l, r) {
        let a = a.as_str();
        let b = b.as_str();
        return match op {
            BinaryOperator::LessThan => a < b,
            BinaryOperator::LessEqual => a <= b,
            BinaryOperator::GreaterThan => a > b,
            BinaryOperator::GreaterEqual => a >= b,
            _ => false,
        };
    }

    let a = to_number_strict(l);
    let b = to_number_strict(r);
    match op {
        BinaryOperator::LessThan => a < b,
        BinaryOperator::LessEqual => a <= b,
        BinaryOperator::GreaterThan => a > b,
        BinaryOperator::GreaterEqual => a >= b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile_formula;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn eval_row(formula: &str, row: &HashMap<String, Value>) -> Value {
        let compiled = compile_formula(formula).unwrap();
        let normalizer = Normalizer::default();
        let clock = FixedClock(NaiveDate::from_ymd_opt(2026, 2, 4).unwrap());
        let ctx = EvaluationContext::new(row, &normalizer, &clock);
        compiled.evaluate(&ctx)
    }

    fn eval(formula: &str) -> Value {
        eval_row(formula, &HashMap::new())
    }

    fn row(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("42"), Value::Number(42.0));
        assert_eq!(eval("'Hello'"), Value::text("Hello"));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("2 + 3 * 4"), Value::Number(14.0));
        assert_eq!(eval("(2 + 3) * 4"), Value::Number(20.0));
        assert_eq!(eval("10 - 4 - 3"), Value::Number(3.0));
        assert_eq!(eval("-[Missing] + 1"), Value::Number(1.0));
        assert_eq!(eval("-'2,5'"), Value::Number(-2.5));
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        let r = row(&[("A", Value::Number(10.0))]);
        assert_eq!(eval_row("[A] / 0", &r), Value::Number(0.0));
        assert_eq!(eval_row("[A] / [Missing]", &r), Value::Number(0.0));
        assert_eq!(eval_row("[A] / 'abc'", &r), Value::Number(0.0));
    }

    #[test]
    fn test_arithmetic_coerces_text_fields() {
        let r = row(&[
            ("Prix", Value::text("1 234,50")),
            ("Qte", Value::text("2")),
        ]);
        assert_eq!(eval_row("[Prix] * [Qte]", &r), Value::Number(2469.0));
    }

    #[test]
    fn test_field_lookup() {
        let r = row(&[("Nom", Value::text("Dupont")), ("nom", Value::text("x"))]);
        assert_eq!(eval_row("[Nom]", &r), Value::text("Dupont"));
        assert_eq!(eval_row("[NOM]", &r), Value::Null);
        assert_eq!(eval_row("[Absent]", &r), Value::Null);
    }

    #[test]
    fn test_equality_on_raw_values() {
        let r = row(&[("Status", Value::text("ok")), ("N", Value::Number(5.0))]);
        assert_eq!(eval_row("[Status] = 'ok'", &r), Value::Boolean(true));
        assert_eq!(eval_row("[Status] <> 'ok'", &r), Value::Boolean(false));
        assert_eq!(eval_row("[N] = '5'", &r), Value::Boolean(true));
        assert_eq!(eval_row("[N] = ' 5 '", &r), Value::Boolean(true));
        assert_eq!(eval_row("[Missing] = 0", &r), Value::Boolean(false));
        assert_eq!(eval_row("[Missing] = [Other]", &r), Value::Boolean(true));
        assert_eq!(eval_row("'abc' = 0", &r), Value::Boolean(false));
    }

    #[test]
    fn test_ordering_on_raw_values() {
        let r = row(&[("Age", Value::Number(20.0)), ("Nom", Value::text("b"))]);
        assert_eq!(eval_row("[Age] > 18", &r), Value::Boolean(true));
        assert_eq!(eval_row("[Age] <= 18", &r), Value::Boolean(false));
        assert_eq!(eval_row("[Nom] > 'a'", &r), Value::Boolean(true));
        // Texts are not parsed as numbers when compared with each other
        assert_eq!(eval("'10' < '9'"), Value::Boolean(true));
        // Number against text converts the text strictly
        assert_eq!(eval("10 > '9'"), Value::Boolean(true));
        assert_eq!(eval("10 > 'abc'"), Value::Boolean(false));
        assert_eq!(eval("10 < 'abc'"), Value::Boolean(false));
        // Null orders as zero
        assert_eq!(eval("[Missing] < 1"), Value::Boolean(true));
    }

    #[test]
    fn test_comparison_result_feeds_arithmetic() {
        // (5 > 3) + 1: a boolean coerces to 0
        assert_eq!(eval("5 > 3 + 1"), Value::Number(1.0));
    }

    #[test]
    fn test_loose_equals() {
        assert!(loose_equals(&Value::Boolean(true), &Value::Number(1.0)));
        assert!(loose_equals(&Value::Date(46057.0), &Value::Number(46057.0)));
        assert!(loose_equals(&Value::text(""), &Value::Number(0.0)));
        assert!(!loose_equals(&Value::Null, &Value::text("")));
        assert!(!loose_equals(
            &Value::Number(f64::NAN),
            &Value::Number(f64::NAN)
        ));
    }

    #[test]
    fn test_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(FixedClock(date).today(), date);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let r = row(&[("A", Value::text("1,5"))]);
        let first = eval_row("[A] * 2 + LEN('abc')", &r);
        for _ in 0..10 {
            assert_eq!(eval_row("[A] * 2 + LEN('abc')", &r), first);
        }
        assert_eq!(first, Value::Number(6.0));
    }
}
