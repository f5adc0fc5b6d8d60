//! Helpers for loosely typed values coming back from the remote API.

use serde_json::Value;

/// Whether a value counts as "set" for the remote API.
///
/// Mirrors the truthiness the remote store applies: `null`, `false`, `0`
/// and the empty string are unset, everything else is set.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a scalar value the way it appears inside a query or identifier.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Compare two field identifiers in identifier space.
///
/// Identifiers compare exactly, except that two plain unsigned integer
/// strings compare as integers (`"06"` equals `"6"`). Signs, exponents,
/// fractions and surrounding whitespace are never normalized.
pub fn fid_eq(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    match (integer_digits(a), integer_digits(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Significant digits of a plain integer identifier, without leading zeros.
fn integer_digits(s: &str) -> Option<&str> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = s.trim_start_matches('0');
    Some(if digits.is_empty() { "0" } else { digits })
}

/// Replace `null` with an empty string, leaving every other value untouched.
pub fn replace_undefined_with_string(value: Value) -> Value {
    match value {
        Value::Null => Value::String(String::new()),
        other => other,
    }
}
