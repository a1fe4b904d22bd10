use crate::types::time::{Time, TimeType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data types a value can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int64,
    Uint64,
    Float64,
    Varchar,
    Date,
    Datetime,
    Timestamp,
    Row,
}

impl From<TimeType> for DataType {
    fn from(tp: TimeType) -> Self {
        match tp {
            TimeType::Date => DataType::Date,
            TimeType::Datetime => DataType::Datetime,
            TimeType::Timestamp => DataType::Timestamp,
        }
    }
}

/// Values produced by evaluation and embedded in expressions as constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    String(String),
    Time(Time),
    Row(Vec<Value>),
}

impl Value {
    /// SQL booleans are the integers 1 and 0.
    pub fn from_bool(b: bool) -> Self {
        Value::Int64(b as i64)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Int64(_) => Some(DataType::Int64),
            Value::Uint64(_) => Some(DataType::Uint64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::Varchar),
            Value::Time(t) => Some(t.time_type().into()),
            Value::Row(_) => Some(DataType::Row),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Uint64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Time(t) => write!(f, "'{}'", t),
            Value::Row(values) => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Time> for Value {
    fn from(v: Time) -> Self {
        Value::Time(v)
    }
}
