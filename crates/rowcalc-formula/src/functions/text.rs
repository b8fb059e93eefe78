//! Text functions
//!
//! Lengths and positions count characters, never bytes.

use super::{arg, number_arg, text_arg};
use crate::evaluator::EvaluationContext;
use rowcalc_core::{to_number_strict, Value};

/// Clamp a numeric position into `0..=len`, NaN counting as 0
fn clamp_index(n: f64, len: usize) -> usize {
    if n.is_nan() || n <= 0.0 {
        0
    } else if n >= len as f64 {
        len
    } else {
        n.trunc() as usize
    }
}

/// Characters between two positions, swapping them if `start > end`
fn substring(s: &str, start: f64, end: f64) -> String {
    let len = s.chars().count();
    let mut from = clamp_index(start, len);
    let mut to = clamp_index(end, len);
    if from > to {
        std::mem::swap(&mut from, &mut to);
    }
    s.chars().skip(from).take(to - from).collect()
}

fn byte_offset(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map_or(s.len(), |(offset, _)| offset)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

/// Replace every literal occurrence of `old`. An empty `old` puts `new`
/// between characters.
fn substitute_all(text: &str, old: &str, new: &str) -> String {
    if old.is_empty() {
        let chars: Vec<String> = text.chars().map(String::from).collect();
        return chars.join(new);
    }
    text.replace(old, new)
}

/// CONCAT/CONCATENER(text1, text2, ..., [separator])
///
/// With three or more arguments, a last argument of at most three
/// characters joins the others.
pub fn fn_concat(args: &[Value], _ctx: &EvaluationContext) -> Value {
    let texts: Vec<String> = args.iter().map(Value::to_display_string).collect();
    if let Some((separator, parts)) = texts.split_last() {
        if parts.len() >= 2 && separator.chars().count() <= 3 {
            return Value::Text(parts.join(separator));
        }
    }
    Value::Text(texts.concat())
}

/// MAJUSCULE/UPPER
pub fn fn_upper(args: &[Value], _ctx: &EvaluationContext) -> Value {
    Value::Text(text_arg(args, 0).to_uppercase())
}

/// MINUSCULE/LOWER
pub fn fn_lower(args: &[Value], _ctx: &EvaluationContext) -> Value {
    Value::Text(text_arg(args, 0).to_lowercase())
}

/// GAUCHE/LEFT(text, count)
///
/// `count` is converted strictly, so `'2,5'` counts as 0.
pub fn fn_left(args: &[Value], _ctx: &EvaluationContext) -> Value {
    let text = text_arg(args, 0);
    let count = to_number_strict(arg(args, 1));
    Value::Text(substring(&text, 0.0, count))
}

/// DROITE/RIGHT(text, count), with `count` converted strictly
pub fn fn_right(args: &[Value], _ctx: &EvaluationContext) -> Value {
    let text = text_arg(args, 0);
    let len = text.chars().count() as f64;
    let count = to_number_strict(arg(args, 1));
    Value::Text(substring(&text, len - count, len))
}

/// LONGUEUR/LEN
pub fn fn_len(args: &[Value], _ctx: &EvaluationContext) -> Value {
    Value::Number(text_arg(args, 0).chars().count() as f64)
}

/// TROUVE/FIND(needle, haystack, [start]): 0-based position or -1
pub fn fn_find(args: &[Value], ctx: &EvaluationContext) -> Value {
    let needle = text_arg(args, 0);
    let haystack = text_arg(args, 1);
    let start = if args.len() > 2 {
        clamp_index(number_arg(args, 2, ctx), haystack.chars().count())
    } else {
        0
    };

    let offset = byte_offset(&haystack, start);
    match haystack[offset..].find(&needle) {
        Some(found) => {
            let index = start + haystack[offset..offset + found].chars().count();
            Value::Number(index as f64)
        }
        None => Value::Number(-1.0),
    }
}

/// CONTIENT/CONTAINS(text, search)
pub fn fn_contains(args: &[Value], _ctx: &EvaluationContext) -> Value {
    let text = text_arg(args, 0);
    let search = text_arg(args, 1);
    Value::Boolean(text.contains(&search))
}

/// SUPPRESPACE/TRIM
pub fn fn_trim(args: &[Value], _ctx: &EvaluationContext) -> Value {
    Value::text(text_arg(args, 0).trim())
}

/// CAPITALISEPREMIER/CAPITALIZE
pub fn fn_capitalize(args: &[Value], _ctx: &EvaluationContext) -> Value {
    Value::Text(capitalize(&text_arg(args, 0)))
}

/// CAPITALISEMOTS/PROPER: capitalize each space-separated word
pub fn fn_proper(args: &[Value], _ctx: &EvaluationContext) -> Value {
    let text = text_arg(args, 0);
    let words: Vec<String> = text.split(' ').map(capitalize).collect();
    Value::Text(words.join(" "))
}

/// REMPLACER/REPLACE(text, pattern, replacement)
///
/// `pattern` is a regular expression; when it does not compile, its
/// literal occurrences are replaced instead.
pub fn fn_replace(args: &[Value], ctx: &EvaluationContext) -> Value {
    let text = text_arg(args, 0);
    let pattern = text_arg(args, 1);
    let replacement = text_arg(args, 2);

    match ctx.normalizer.pattern(&pattern) {
        Some(re) => Value::Text(re.replace_all(&text, replacement.as_str()).into_owned()),
        None => {
            log::debug!("invalid pattern {:?}, replacing literally", pattern);
            Value::Text(substitute_all(&text, &pattern, &replacement))
        }
    }
}

/// SUBSTITUER/SUBSTITUTE(text, old, new)
pub fn fn_substitute(args: &[Value], _ctx: &EvaluationContext) -> Value {
    let text = text_arg(args, 0);
    let old = text_arg(args, 1);
    let new = text_arg(args, 2);
    Value::Text(substitute_all(&text, &old, &new))
}

/// EXTRAIRE/MID(text, start, [length]), 0-based
pub fn fn_extract(args: &[Value], ctx: &EvaluationContext) -> Value {
    let text = text_arg(args, 0);
    let start = number_arg(args, 1, ctx);
    let end = match args.get(2) {
        Some(_) => start + number_arg(args, 2, ctx),
        None => f64::INFINITY,
    };
    Value::Text(substring(&text, start, end))
}
