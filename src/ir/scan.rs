//! Reference-name extraction from formula text.
//!
//! Only identifiers are recovered; formulas are never evaluated. Numeric
//! literals (including exponent notation), operators, and well-known
//! function names are skipped.

use once_cell::sync::Lazy;
use regex::Regex;

/// Numbers first so `2e5` is one literal, not `2` followed by `e5`.
#[allow(clippy::expect_used)]
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+(?:\.\d+)?(?:[eE][+-]?\d+)?|[\p{L}_][\p{L}\p{N}_]*")
        .expect("token pattern is valid")
});

/// Function and constant names that never refer to a parameter.
const RESERVED: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "sinh", "cosh", "tanh", "exp", "ln",
    "log", "log10", "sqrt", "abs", "min", "max", "sign", "diff", "grad", "sum", "pi", "π", "inf",
];

/// Marker that flags an incomplete expression.
pub const UNDEFINED_MARKER: &str = "undefined";

/// Extract the distinct identifiers referenced by `expression`, in order of
/// first appearance.
#[must_use]
pub fn extract_identifiers(expression: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in TOKEN.find_iter(expression) {
        let token = m.as_str();
        if token.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        if RESERVED.contains(&token) || token.eq_ignore_ascii_case(UNDEFINED_MARKER) {
            continue;
        }
        if !out.iter().any(|t| t == token) {
            out.push(token.to_string());
        }
    }
    out
}

/// Extract identifiers from `expression` that name one of `symbols`.
#[must_use]
pub fn referenced_symbols<'a, I>(expression: &str, symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let found = extract_identifiers(expression);
    let mut out: Vec<String> = Vec::new();
    for symbol in symbols {
        if found.iter().any(|f| f == symbol) && !out.iter().any(|o| o == symbol) {
            out.push(symbol.to_string());
        }
    }
    out
}

/// Whether an expression embeds an explicit "undefined" marker.
#[must_use]
pub fn has_undefined_marker(expression: &str) -> bool {
    expression.to_lowercase().contains(UNDEFINED_MARKER)
}

/// Whether the expression is a differential equation in `diff(x, t)` form.
#[must_use]
pub fn is_differential(expression: &str) -> bool {
    expression.contains("diff(")
}

/// Derivative order of a `diff(...)` expression: `diff(x, t, 2)` is second
/// order, nested `diff(diff(x, t), t)` also counts.
#[must_use]
pub fn differential_order(expression: &str) -> Option<u8> {
    if !is_differential(expression) {
        return None;
    }
    let nested = u8::try_from(expression.matches("diff(").count()).unwrap_or(u8::MAX);
    let explicit = expression
        .split("diff(")
        .skip(1)
        .filter_map(|rest| {
            let inner = rest.split(')').next()?;
            let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
            if parts.len() == 3 {
                parts[2].parse::<u8>().ok()
            } else {
                None
            }
        })
        .max()
        .unwrap_or(1);
    Some(explicit.max(if nested > 1 { nested } else { 1 }))
}
