//! Value coercion for scalar field types
//!
//! Each coercer takes an arbitrary JSON value and returns the canonical
//! representation for its type, or a conversion error.
//!
//! - boolean: true/false literals, "true"/"false" in any case, null as false
//! - number: null passes through, numbers pass through, strings parse as
//!   integer then float
//! - string: null passes through, everything else becomes its text form
//! - objectid: sub-documents must carry a non-empty `_id`, everything else
//!   becomes its text form
//! - mixed: accepted verbatim

use serde_json::{Number, Value};

use super::errors::{FieldError, FieldResult};

/// Identity key carried by referenced sub-documents
pub const ID_KEY: &str = "_id";

/// Coerce a value into a boolean.
pub fn coerce_boolean(raw: Value) -> FieldResult<Value> {
    match raw {
        Value::Bool(_) => Ok(raw),
        Value::Null => Ok(Value::Bool(false)),
        Value::String(ref s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(ref s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        other => Err(FieldError::conversion("Boolean", &other)),
    }
}

/// Coerce a value into a number, preferring integers over floats.
pub fn coerce_number(raw: Value) -> FieldResult<Value> {
    match raw {
        Value::Null | Value::Number(_) => Ok(raw),
        Value::Bool(b) => Ok(Value::from(i64::from(b))),
        Value::String(ref s) => {
            parse_number(s.trim()).ok_or_else(|| FieldError::conversion("Number", &raw))
        }
        other => Err(FieldError::conversion("Number", &other)),
    }
}

fn parse_number(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    if let Ok(u) = s.parse::<u64>() {
        return Some(Value::from(u));
    }
    // an integer beyond 64 bits would lose digits as a float
    if is_integer_literal(s) {
        return None;
    }
    // NaN and infinities have no JSON form
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Coerce a value into a string.
pub fn coerce_string(raw: Value) -> FieldResult<Value> {
    match raw {
        Value::Null | Value::String(_) => Ok(raw),
        other => Ok(Value::String(textual(&other))),
    }
}

/// Coerce a value into an object id.
///
/// A sub-document is accepted only when it already carries a non-empty
/// identity key; the id itself is stored.
pub fn coerce_object_id(raw: Value) -> FieldResult<Value> {
    match raw {
        Value::Null => Ok(raw),
        Value::Object(ref map) => match map.get(ID_KEY) {
            Some(id) if is_present(id) => Ok(Value::String(textual(id))),
            _ => Err(FieldError::conversion("ObjectId", &raw)),
        },
        other => Ok(Value::String(textual(&other))),
    }
}

/// Mixed values are never converted.
pub fn coerce_mixed(raw: Value) -> FieldResult<Value> {
    Ok(raw)
}

/// Text form of a value: strings unquoted, everything else as JSON.
fn textual(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
