//! Built-in functions
//!
//! Every function has one French and one or more English names. The names
//! are resolved once, at compile time, by [`Function::lookup`].

pub mod date;
pub mod logical;
pub mod math;
pub mod text;

use crate::evaluator::{evaluate, EvaluationContext};
use crate::expr::Expr;
use rowcalc_core::Value;

/// Function implementation signature, over already-evaluated arguments
pub type FunctionImpl = fn(&[Value], &EvaluationContext) -> Value;

/// A built-in function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    // Logical
    If,

    // Math
    Sum,
    Average,
    Min,
    Max,
    Round,
    Abs,

    // Text
    Concat,
    Upper,
    Lower,
    Left,
    Right,
    Len,
    Find,
    Contains,
    Trim,
    Capitalize,
    Proper,
    Replace,
    Substitute,
    Extract,

    // Date
    Year,
    Month,
    Day,
    Date,
    Today,
    DateDif,
}

impl Function {
    /// Resolve an upper-cased identifier, French or English
    pub fn lookup(name: &str) -> Option<Function> {
        Some(match name {
            "SI" | "IF" => Function::If,

            "SOMME" | "SUM" => Function::Sum,
            "MOYENNE" | "AVG" | "AVERAGE" => Function::Average,
            "MIN" => Function::Min,
            "MAX" => Function::Max,
            "ARRONDI" | "ROUND" => Function::Round,
            "ABS" => Function::Abs,

            "CONCAT" | "CONCATENER" => Function::Concat,
            "MAJUSCULE" | "UPPER" => Function::Upper,
            "MINUSCULE" | "LOWER" => Function::Lower,
            "GAUCHE" | "LEFT" => Function::Left,
            "DROITE" | "RIGHT" => Function::Right,
            "LONGUEUR" | "LEN" | "LENGTH" => Function::Len,
            "TROUVE" | "FIND" | "SEARCH" => Function::Find,
            "CONTIENT" | "CONTAINS" | "INCLUS" => Function::Contains,
            "SUPPRESPACE" | "TRIM" | "NETTOYER" => Function::Trim,
            "CAPITALISEPREMIER" | "CAPITALIZE" => Function::Capitalize,
            "CAPITALISEMOTS" | "PROPER" | "TITLE" => Function::Proper,
            "REMPLACER" | "REPLACE" => Function::Replace,
            "SUBSTITUER" | "SUBSTITUTE" => Function::Substitute,
            "EXTRAIRE" | "SUBSTRING" | "MID" => Function::Extract,

            "ANNEE" | "YEAR" => Function::Year,
            "MOIS" | "MONTH" => Function::Month,
            "JOUR" | "DAY" => Function::Day,
            "DATE" => Function::Date,
            "AUJOURDHUI" | "TODAY" => Function::Today,
            "DATEDIF" => Function::DateDif,

            _ => return None,
        })
    }

    /// Canonical English name
    pub fn name(&self) -> &'static str {
        match self {
            Function::If => "IF",
            Function::Sum => "SUM",
            Function::Average => "AVERAGE",
            Function::Min => "MIN",
            Function::Max => "MAX",
            Function::Round => "ROUND",
            Function::Abs => "ABS",
            Function::Concat => "CONCAT",
            Function::Upper => "UPPER",
            Function::Lower => "LOWER",
            Function::Left => "LEFT",
            Function::Right => "RIGHT",
            Function::Len => "LEN",
            Function::Find => "FIND",
            Function::Contains => "CONTAINS",
            Function::Trim => "TRIM",
            Function::Capitalize => "CAPITALIZE",
            Function::Proper => "PROPER",
            Function::Replace => "REPLACE",
            Function::Substitute => "SUBSTITUTE",
            Function::Extract => "MID",
            Function::Year => "YEAR",
            Function::Month => "MONTH",
            Function::Day => "DAY",
            Function::Date => "DATE",
            Function::Today => "TODAY",
            Function::DateDif => "DATEDIF",
        }
    }

    /// Implementation over evaluated arguments. `IF` evaluates lazily and
    /// has none.
    fn implementation(&self) -> Option<FunctionImpl> {
        let f: FunctionImpl = match self {
            Function::If => return None,

            Function::Sum => math::fn_sum,
            Function::Average => math::fn_average,
            Function::Min => math::fn_min,
            Function::Max => math::fn_max,
            Function::Round => math::fn_round,
            Function::Abs => math::fn_abs,

            Function::Concat => text::fn_concat,
            Function::Upper => text::fn_upper,
            Function::Lower => text::fn_lower,
            Function::Left => text::fn_left,
            Function::Right => text::fn_right,
            Function::Len => text::fn_len,
            Function::Find => text::fn_find,
            Function::Contains => text::fn_contains,
            Function::Trim => text::fn_trim,
            Function::Capitalize => text::fn_capitalize,
            Function::Proper => text::fn_proper,
            Function::Replace => text::fn_replace,
            Function::Substitute => text::fn_substitute,
            Function::Extract => text::fn_extract,

            Function::Year => date::fn_year,
            Function::Month => date::fn_month,
            Function::Day => date::fn_day,
            Function::Date => date::fn_date,
            Function::Today => date::fn_today,
            Function::DateDif => date::fn_datedif,
        };
        Some(f)
    }
}

/// Call a function on unevaluated argument expressions
pub fn call(function: Function, args: &[Expr], ctx: &EvaluationContext) -> Value {
    match function.implementation() {
        Some(implementation) => {
            let values: Vec<Value> = args.iter().map(|arg| evaluate(arg, ctx)).collect();
            implementation(&values, ctx)
        }
        None => logical::fn_if(args, ctx),
    }
}

static NULL: Value = Value::Null;

/// Argument `index`, or Null when it was not supplied
pub(crate) fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

/// Argument `index` through the numeric normalizer
pub(crate) fn number_arg(args: &[Value], index: usize, ctx: &EvaluationContext) -> f64 {
    ctx.number(arg(args, index))
}

/// Argument `index` as display text
pub(crate) fn text_arg(args: &[Value], index: usize) -> String {
    arg(args, index).to_display_string()
}
