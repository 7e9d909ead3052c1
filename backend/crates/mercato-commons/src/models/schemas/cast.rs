//! Scalar casting rules shared by descriptor parsing and document validation.
//!
//! Casting is lenient in the direction a form submission needs (`"12"` becomes
//! `12` for a number field) and strict everywhere else. Dates are normalized to
//! RFC 3339 strings with millisecond precision in UTC.

use super::field_type::FieldType;
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};

/// Largest integer exactly representable as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Maximum accepted length of an identity reference.
const MAX_REFERENCE_LEN: usize = 128;

/// Casts `value` to the scalar `field_type`.
///
/// Returns an error message suitable for a validation report. Calling this with
/// `FieldType::Array` or `FieldType::Object` is an error: containers are walked
/// by the caller.
pub fn cast_scalar(field_type: FieldType, value: &Value) -> Result<Value, String> {
    match field_type {
        FieldType::String => cast_string(value),
        FieldType::Number => cast_number(value),
        FieldType::Boolean => cast_boolean(value),
        FieldType::Date => cast_date(value),
        FieldType::ObjectId => cast_reference(value),
        FieldType::Array | FieldType::Object => Err(format!(
            "'{}' is not a scalar type",
            field_type.as_str()
        )),
    }
}

fn cast_failed(field_type: &str, value: &Value) -> String {
    format!("Cast to {} failed for value {}", field_type, value)
}

fn cast_string(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        _ => Err(cast_failed("string", value)),
    }
}

/// Builds a JSON number, keeping integral values as integers.
pub fn number_value(f: f64) -> Option<Value> {
    if !f.is_finite() {
        return None;
    }
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number)
}

fn cast_number(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(number_value)
            .ok_or_else(|| cast_failed("number", value)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(number_value)
            .ok_or_else(|| cast_failed("number", value)),
        Value::Bool(b) => Ok(Value::from(if *b { 1 } else { 0 })),
        _ => Err(cast_failed("number", value)),
    }
}

fn cast_boolean(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "0" | "no" => Ok(Value::Bool(false)),
            _ => Err(cast_failed("boolean", value)),
        },
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Ok(Value::Bool(true)),
            Some(f) if f == 0.0 => Ok(Value::Bool(false)),
            _ => Err(cast_failed("boolean", value)),
        },
        _ => Err(cast_failed("boolean", value)),
    }
}

/// Parses a date value (RFC 3339, `YYYY-MM-DD`, or epoch milliseconds).
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Formats a timestamp the way dates are stored.
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn cast_date(value: &Value) -> Result<Value, String> {
    parse_date(value)
        .map(|dt| Value::String(format_date(&dt)))
        .ok_or_else(|| cast_failed("date", value))
}

fn cast_reference(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(s)
            if !s.is_empty()
                && s.len() <= MAX_REFERENCE_LEN
                && !s.chars().any(char::is_whitespace) =>
        {
            Ok(value.clone())
        }
        _ => Err(cast_failed("objectId", value)),
    }
}
