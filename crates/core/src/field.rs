//! Lenient decoding of individual record fields.
//!
//! The feed does not guarantee a stable representation for numeric
//! readings: the same field may arrive as an integer, a floating-point
//! number, or a numeric string. Decoders here accept all three and return
//! [`CoreError::InvalidField`] for anything else, leaving the choice of
//! fallback to the caller.

use serde_json::Value;

use crate::error::CoreError;
use crate::types::Record;

/// Look up a field, treating an explicit `null` the same as a missing key.
pub fn field<'a>(record: &'a Record, name: &str) -> Option<&'a Value> {
    record.get(name).filter(|v| !v.is_null())
}

/// Decode a floating-point reading.
pub fn decode_f64(name: &'static str, value: &Value) -> Result<f64, CoreError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CoreError::invalid_field(name, format!("unrepresentable number {n}")))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| CoreError::invalid_field(name, format!("{s:?}: {e}")))?,
        other => {
            return Err(CoreError::invalid_field(
                name,
                format!("expected number, got {other}"),
            ))
        }
    };

    if !parsed.is_finite() {
        return Err(CoreError::invalid_field(name, "value is not finite"));
    }
    Ok(parsed)
}

/// Decode an integer reading. Floating-point values are truncated toward zero.
pub fn decode_i64(name: &'static str, value: &Value) -> Result<i64, CoreError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.is_finite() => Ok(f.trunc() as i64),
                _ => Err(CoreError::invalid_field(
                    name,
                    format!("unrepresentable number {n}"),
                )),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| CoreError::invalid_field(name, format!("{s:?}: {e}"))),
        other => Err(CoreError::invalid_field(
            name,
            format!("expected integer, got {other}"),
        )),
    }
}

/// Decode a boolean flag. Non-boolean values yield `None`.
pub fn decode_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

/// Read a boolean flag from a record, defaulting to `false` when the field is
/// missing or not a boolean.
pub fn flag(record: &Record, name: &str) -> bool {
    field(record, name).and_then(decode_bool).unwrap_or(false)
}
