//! Converters: the first half of each coercion rule
//!
//! A converter normalizes loosely typed wire input into the JSON shape its
//! field expects. It never checks the final type; that is the validator's
//! job, so a converter may pass an unexpected value through unchanged.

use crate::core::literal;
use crate::error::{GateError, Result};
use serde_json::{Number, Value};

/// Converter signature
pub type Converter = fn(Value) -> Result<Value>;

/// Leave the value untouched
pub fn identity(value: Value) -> Result<Value> {
    Ok(value)
}

/// Array passes; strings decode as list literals or split on commas
pub fn list(value: Value) -> Result<Value> {
    match value {
        Value::Array(_) => Ok(value),
        Value::String(s) => literal::decode_list(&s)
            .map(Value::Array)
            .ok_or_else(|| GateError::conversion(format!("{s:?}"), "list")),
        other => Err(GateError::conversion(other, "list")),
    }
}

/// Integers pass; numeric strings parse
pub fn int(value: Value) -> Result<Value> {
    match value {
        Value::Number(ref n) if n.is_i64() => Ok(value),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(|i| Value::Number(Number::from(i)))
            .map_err(|_| GateError::conversion(format!("{s:?}"), "int")),
        other => Err(GateError::conversion(other, "int")),
    }
}

/// Bools pass; 0/1 and `true`/`false` (any case) convert
///
/// Other strings are literal-decoded, then converted again.
pub fn boolean(value: Value) -> Result<Value> {
    match value {
        Value::Number(ref n) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Ok(value),
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => match literal::parse(&s) {
                Some(decoded) => boolean(decoded),
                None => Err(GateError::conversion(format!("{s:?}"), "bool")),
            },
        },
        other => Ok(other),
    }
}

/// Strings are literal-decoded; other values pass
pub fn structured(value: Value) -> Result<Value> {
    match value {
        Value::String(s) => {
            literal::parse(&s).ok_or_else(|| GateError::conversion(format!("{s:?}"), "Any"))
        }
        other => Ok(other),
    }
}
