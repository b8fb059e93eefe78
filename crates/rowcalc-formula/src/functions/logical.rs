//! Logical functions

use crate::evaluator::{evaluate, EvaluationContext};
use crate::expr::Expr;
use rowcalc_core::Value;

/// SI/IF(condition, then, else)
///
/// Only the selected branch is evaluated; a missing branch is Null.
pub fn fn_if(args: &[Expr], ctx: &EvaluationContext) -> Value {
    let condition = match args.first() {
        Some(expr) => evaluate(expr, ctx),
        None => Value::Null,
    };
    let branch = if condition.is_truthy() { 1 } else { 2 };
    match args.get(branch) {
        Some(expr) => evaluate(expr, ctx),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use crate::functions::test_support::{eval, eval_row};
    use rowcalc_core::Value;
    use std::collections::HashMap;

    #[test]
    fn test_if_french_and_english() {
        let mut row = HashMap::new();
        row.insert("Age".to_string(), Value::Number(20.0));
        assert_eq!(
            eval_row("SI([Age] > 18, 'Majeur', 'Mineur')", &row),
            Value::text("Majeur")
        );
        assert_eq!(
            eval_row("IF([Age] > 18, 'Majeur', 'Mineur')", &row),
            Value::text("Majeur")
        );

        row.insert("Age".to_string(), Value::Number(12.0));
        assert_eq!(
            eval_row("si([Age] > 18, 'Majeur', 'Mineur')", &row),
            Value::text("Mineur")
        );
    }

    #[test]
    fn test_if_truthiness() {
        assert_eq!(eval("IF(0, 1, 2)"), Value::Number(2.0));
        assert_eq!(eval("IF('', 1, 2)"), Value::Number(2.0));
        assert_eq!(eval("IF('0', 1, 2)"), Value::Number(1.0));
        assert_eq!(eval("IF([Missing], 1, 2)"), Value::Number(2.0));
        assert_eq!(eval("IF(-3, 1, 2)"), Value::Number(1.0));
    }

    #[test]
    fn test_if_missing_branches() {
        assert_eq!(eval("IF(1, 'yes')"), Value::text("yes"));
        assert_eq!(eval("IF(0, 'yes')"), Value::Null);
        assert_eq!(eval("IF()"), Value::Null);
    }

    #[test]
    fn test_if_nested() {
        assert_eq!(
            eval("SI(5 > 10, 'big', SI(5 > 3, 'medium', 'small'))"),
            Value::text("medium")
        );
    }
}
