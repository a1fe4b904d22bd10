//! Runtime value model.
//!
//! This module provides:
//! - **Value**: the tagged scalar/row value produced by evaluation
//! - **Time**: MySQL-flavoured date/datetime/timestamp values with fsp
//! - **convert**: coercions between value kinds (CAST targets, truthiness,
//!   comparison)

pub mod convert;
pub mod time;
pub mod value;

pub use convert::{
    compare_values, convert, numeric_prefix, to_bool, to_f64, to_i64, to_text, to_u64, ConvertError,
    FieldType,
};
pub use time::{parse_time, parse_time_from_num, Time, TimeError, TimeType};
pub use value::{DataType, Value};
