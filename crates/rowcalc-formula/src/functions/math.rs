//! Math functions

use super::number_arg;
use crate::evaluator::EvaluationContext;
use rowcalc_core::Value;

/// SOMME/SUM
pub fn fn_sum(args: &[Value], ctx: &EvaluationContext) -> Value {
    Value::Number(args.iter().map(|v| ctx.number(v)).sum())
}

/// MOYENNE/AVERAGE, 0 without arguments
pub fn fn_average(args: &[Value], ctx: &EvaluationContext) -> Value {
    if args.is_empty() {
        return Value::Number(0.0);
    }
    let sum: f64 = args.iter().map(|v| ctx.number(v)).sum();
    Value::Number(sum / args.len() as f64)
}

/// MIN, +∞ without arguments
pub fn fn_min(args: &[Value], ctx: &EvaluationContext) -> Value {
    Value::Number(args.iter().map(|v| ctx.number(v)).fold(f64::INFINITY, f64::min))
}

/// MAX, −∞ without arguments
pub fn fn_max(args: &[Value], ctx: &EvaluationContext) -> Value {
    Value::Number(args.iter().map(|v| ctx.number(v)).fold(f64::NEG_INFINITY, f64::max))
}

/// ARRONDI/ROUND(x, [digits]), rounding half up
pub fn fn_round(args: &[Value], ctx: &EvaluationContext) -> Value {
    let x = number_arg(args, 0, ctx);
    let factor = 10f64.powf(number_arg(args, 1, ctx));
    Value::Number((x * factor + 0.5).floor() / factor)
}

/// ABS
pub fn fn_abs(args: &[Value], ctx: &EvaluationContext) -> Value {
    Value::Number(number_arg(args, 0, ctx).abs())
}

#[cfg(test)]
mod tests {
    use crate::functions::test_support::{eval, eval_row};
    use rowcalc_core::Value;
    use std::collections::HashMap;

    #[test]
    fn test_sum() {
        assert_eq!(eval("SUM(1, 2, 3)"), Value::Number(6.0));
        assert_eq!(eval("SOMME('1,5', '2.5', 'abc')"), Value::Number(4.0));
        assert_eq!(eval("SUM()"), Value::Number(0.0));
    }

    #[test]
    fn test_average() {
        assert_eq!(eval("AVERAGE(1, 2, 3)"), Value::Number(2.0));
        assert_eq!(eval("MOYENNE(10, 'x')"), Value::Number(5.0));
        assert_eq!(eval("AVG()"), Value::Number(0.0));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(eval("MIN(3, 1, 2)"), Value::Number(1.0));
        assert_eq!(eval("MAX(3, '10', 2)"), Value::Number(10.0));
        assert_eq!(eval("MIN()"), Value::Number(f64::INFINITY));
        assert_eq!(eval("MAX()"), Value::Number(f64::NEG_INFINITY));
    }

    #[test]
    fn test_round() {
        assert_eq!(eval("ROUND(3.14159, 2)"), Value::Number(3.14));
        assert_eq!(eval("ARRONDI(2.5)"), Value::Number(3.0));
        assert_eq!(eval("ROUND(-2.5, 0)"), Value::Number(-2.0));
        assert_eq!(eval("ROUND(1234, -2)"), Value::Number(1200.0));
    }

    #[test]
    fn test_abs() {
        assert_eq!(eval("ABS(-5)"), Value::Number(5.0));
        let mut row = HashMap::new();
        row.insert("Delta".to_string(), Value::text("-1 250,5"));
        assert_eq!(eval_row("ABS([Delta])", &row), Value::Number(1250.5));
    }
}
