//! Conversions between value kinds.
//!
//! These follow MySQL's lenient coercion rules where evaluation needs them
//! (string truthiness, mixed comparisons) and are strict for explicit casts.

use crate::types::time::{parse_time, parse_time_from_num, Time, TimeError, TimeType, MAX_FSP};
use crate::types::value::Value;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Errors raised while coercing a value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Cannot convert {value} to {target}")]
    Incompatible { value: String, target: String },

    #[error("{target} value is out of range: {value}")]
    Overflow { value: String, target: String },

    #[error("Truncated incorrect {target} value: {value}")]
    InvalidNumber { value: String, target: String },

    #[error(transparent)]
    Time(#[from] TimeError),
}

/// Target types for CAST and internal coercions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Longlong,
    UnsignedLonglong,
    Double,
    VarString,
    Date,
    Datetime(u8),
    Timestamp(u8),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Longlong => write!(f, "SIGNED"),
            FieldType::UnsignedLonglong => write!(f, "UNSIGNED"),
            FieldType::Double => write!(f, "DOUBLE"),
            FieldType::VarString => write!(f, "CHAR"),
            FieldType::Date => write!(f, "DATE"),
            FieldType::Datetime(0) => write!(f, "DATETIME"),
            FieldType::Datetime(fsp) => write!(f, "DATETIME({})", fsp),
            FieldType::Timestamp(0) => write!(f, "TIMESTAMP"),
            FieldType::Timestamp(fsp) => write!(f, "TIMESTAMP({})", fsp),
        }
    }
}

fn incompatible(value: &Value, target: &str) -> ConvertError {
    ConvertError::Incompatible {
        value: value.to_string(),
        target: target.to_string(),
    }
}

fn overflow(value: &Value, target: &str) -> ConvertError {
    ConvertError::Overflow {
        value: value.to_string(),
        target: target.to_string(),
    }
}

fn invalid_number(value: &Value, target: &str) -> ConvertError {
    ConvertError::InvalidNumber {
        value: value.to_string(),
        target: target.to_string(),
    }
}

/// Converts `value` into `target`. NULL stays NULL.
pub fn convert(value: &Value, target: &FieldType) -> Result<Value, ConvertError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match target {
        FieldType::Longlong => to_i64(value).map(Value::Int64),
        FieldType::UnsignedLonglong => to_u64(value).map(Value::Uint64),
        FieldType::Double => to_f64(value).map(Value::Float64),
        FieldType::VarString => to_text(value).map(Value::String),
        FieldType::Date => to_time(value, TimeType::Date, 0),
        FieldType::Datetime(fsp) => to_time(value, TimeType::Datetime, *fsp),
        FieldType::Timestamp(fsp) => to_time(value, TimeType::Timestamp, *fsp),
    }
}

fn to_time(value: &Value, tp: TimeType, fsp: u8) -> Result<Value, ConvertError> {
    let fsp = fsp as i32;
    let time = match value {
        Value::String(s) => parse_time(s, tp, fsp)?,
        Value::Int64(n) => parse_time_from_num(*n, tp, fsp)?,
        Value::Uint64(n) => {
            let n = i64::try_from(*n).map_err(|_| overflow(value, tp.as_str()))?;
            parse_time_from_num(n, tp, fsp)?
        }
        Value::Float64(_) => parse_time_from_num(to_i64(value)?, tp, fsp)?,
        Value::Time(t) => t.convert(tp, fsp as u8)?,
        Value::Null => return Ok(Value::Null),
        Value::Row(_) => return Err(incompatible(value, tp.as_str())),
    };
    Ok(Value::Time(time))
}

fn f64_to_i64(f: f64, value: &Value) -> Result<i64, ConvertError> {
    let rounded = f.round();
    if rounded.is_nan() || !(-9.223_372_036_854_776e18..9.223_372_036_854_776e18).contains(&rounded)
    {
        return Err(overflow(value, "BIGINT"));
    }
    Ok(rounded as i64)
}

/// Signed integer coercion. Floats round half away from zero.
pub fn to_i64(value: &Value) -> Result<i64, ConvertError> {
    match value {
        Value::Null => Ok(0),
        Value::Int64(v) => Ok(*v),
        Value::Uint64(v) => i64::try_from(*v).map_err(|_| overflow(value, "BIGINT")),
        Value::Float64(f) => f64_to_i64(*f, value),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                return Ok(v);
            }
            match s.parse::<f64>() {
                Ok(f) => f64_to_i64(f, value),
                Err(_) => Err(invalid_number(value, "INTEGER")),
            }
        }
        Value::Time(t) => Ok(t.to_packed_i64()),
        Value::Row(_) => Err(incompatible(value, "BIGINT")),
    }
}

/// Unsigned integer coercion. Negative integers wrap as in MySQL's
/// `CAST(.. AS UNSIGNED)`.
pub fn to_u64(value: &Value) -> Result<u64, ConvertError> {
    match value {
        Value::Uint64(v) => Ok(*v),
        Value::Float64(f) if *f < 0.0 => Err(overflow(value, "BIGINT UNSIGNED")),
        Value::Float64(f) => {
            let rounded = f.round();
            if rounded.is_nan() || rounded >= 1.844_674_407_370_955_2e19 {
                return Err(overflow(value, "BIGINT UNSIGNED"));
            }
            Ok(rounded as u64)
        }
        Value::String(s) => match s.trim().parse::<u64>() {
            Ok(v) => Ok(v),
            Err(_) => to_i64(value).map(|v| v as u64),
        },
        _ => to_i64(value).map(|v| v as u64),
    }
}

/// Floating point coercion.
pub fn to_f64(value: &Value) -> Result<f64, ConvertError> {
    match value {
        Value::Null => Ok(0.0),
        Value::Int64(v) => Ok(*v as f64),
        Value::Uint64(v) => Ok(*v as f64),
        Value::Float64(v) => Ok(*v),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid_number(value, "DOUBLE")),
        Value::Time(t) => Ok(t.to_packed_i64() as f64),
        Value::Row(_) => Err(incompatible(value, "DOUBLE")),
    }
}

/// String coercion, without the quoting `Display` adds.
pub fn to_text(value: &Value) -> Result<String, ConvertError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Int64(v) => Ok(v.to_string()),
        Value::Uint64(v) => Ok(v.to_string()),
        Value::Float64(v) => Ok(v.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Time(t) => Ok(t.to_string()),
        Value::Row(_) => Err(incompatible(value, "CHAR")),
    }
}

/// Truthiness of an evaluated value. NULL is false; strings use their
/// leading numeric part, so `'1abc'` is true and `'abc'` is false.
pub fn to_bool(value: &Value) -> Result<bool, ConvertError> {
    match value {
        Value::Null => Ok(false),
        Value::Int64(v) => Ok(*v != 0),
        Value::Uint64(v) => Ok(*v != 0),
        Value::Float64(v) => Ok(*v != 0.0),
        Value::String(s) => Ok(numeric_prefix(s) != 0.0),
        Value::Time(t) => Ok(!t.is_zero()),
        Value::Row(_) => Err(incompatible(value, "BOOLEAN")),
    }
}

/// Value of the longest numeric prefix of `s`, or 0.
pub fn numeric_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || (end == digits_start + 1 && bytes[digits_start] == b'.') {
        return 0.0;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

fn numeric_for_compare(value: &Value) -> Result<f64, ConvertError> {
    match value {
        Value::String(s) => Ok(numeric_prefix(s)),
        other => to_f64(other),
    }
}

// Comparison literals are parsed without the TIMESTAMP range check, at full precision.
fn comparison_time(s: &str) -> Result<Time, TimeError> {
    parse_time(s, TimeType::Datetime, MAX_FSP as i32)
}

/// Orders two values. NULL sorts first; callers implementing three-valued
/// logic must handle NULL before calling this.
pub fn compare_values(left: &Value, right: &Value) -> Result<Ordering, ConvertError> {
    let ordering = match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
        (Value::Uint64(a), Value::Uint64(b)) => a.cmp(b),
        (Value::Int64(a), Value::Uint64(b)) => match u64::try_from(*a) {
            Ok(a) => a.cmp(b),
            Err(_) => Ordering::Less,
        },
        (Value::Uint64(a), Value::Int64(b)) => match u64::try_from(*b) {
            Ok(b) => a.cmp(&b),
            Err(_) => Ordering::Greater,
        },
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Time(a), Value::Time(b)) => a.datetime().cmp(&b.datetime()),
        (Value::Time(a), Value::String(s)) => a.datetime().cmp(&comparison_time(s)?.datetime()),
        (Value::String(s), Value::Time(b)) => comparison_time(s)?.datetime().cmp(&b.datetime()),
        (Value::Row(a), Value::Row(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let ordering = compare_values(x, y)?;
                if ordering != Ordering::Equal {
                    return Ok(ordering);
                }
            }
            a.len().cmp(&b.len())
        }
        (Value::Row(_), _) => return Err(incompatible(right, "ROW")),
        (_, Value::Row(_)) => return Err(incompatible(left, "ROW")),
        _ => numeric_for_compare(left)?.total_cmp(&numeric_for_compare(right)?),
    };
    Ok(ordering)
}
