//! Date and time values.
//!
//! A [`Time`] is a calendar instant tagged with the SQL type it belongs to
//! (`DATE`, `DATETIME` or `TIMESTAMP`) and with its fractional seconds
//! precision (fsp). The all-zero value `0000-00-00 00:00:00` is representable
//! even though it is not a valid calendar date.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Largest supported fractional seconds precision.
pub const MAX_FSP: u8 = 6;

/// Precision used when none is given.
pub const DEFAULT_FSP: u8 = 0;

/// Sentinel for "precision not specified"; resolves to [`DEFAULT_FSP`].
pub const UNSPECIFIED_FSP: i32 = -1;

/// `TIMESTAMP` values must lie in `[1970-01-01 00:00:01, 2038-01-19 03:14:07]` UTC.
const MIN_TIMESTAMP_SECS: i64 = 1;
const MAX_TIMESTAMP_SECS: i64 = 2_147_483_647;

/// Two-digit years below this value belong to the 2000s.
const YY_PART_YEAR: i64 = 70;

/// Errors raised while building or parsing time values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    #[error("Incorrect time value: '{0}'")]
    InvalidFormat(String),

    #[error("Incorrect time value: {0}")]
    InvalidNumber(i64),

    #[error("Invalid fsp {0}, must be in range [0, 6]")]
    InvalidFsp(i32),

    #[error("Timestamp value out of range: '{0}'")]
    TimestampOutOfRange(String),
}

/// SQL temporal column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeType {
    Date,
    Datetime,
    Timestamp,
}

impl TimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeType::Date => "DATE",
            TimeType::Datetime => "DATETIME",
            TimeType::Timestamp => "TIMESTAMP",
        }
    }
}

/// Validates a requested precision, mapping [`UNSPECIFIED_FSP`] to the default.
pub fn check_fsp(fsp: i32) -> Result<u8, TimeError> {
    if fsp == UNSPECIFIED_FSP {
        return Ok(DEFAULT_FSP);
    }
    if fsp < 0 || fsp > MAX_FSP as i32 {
        return Err(TimeError::InvalidFsp(fsp));
    }
    Ok(fsp as u8)
}

/// A typed date/time value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Time {
    /// `None` is the zero value.
    datetime: Option<NaiveDateTime>,
    tp: TimeType,
    fsp: u8,
}

impl Time {
    /// The canonical zero value for `tp`.
    pub fn zero(tp: TimeType, fsp: u8) -> Self {
        Self {
            datetime: None,
            tp,
            fsp: fsp.min(MAX_FSP),
        }
    }

    /// Builds a time from a calendar instant, rounding to `fsp` digits and
    /// truncating the clock part for `DATE`.
    pub fn new(datetime: NaiveDateTime, tp: TimeType, fsp: u8) -> Result<Self, TimeError> {
        let fsp = fsp.min(MAX_FSP);
        let mut datetime = round_to_fsp(datetime, fsp)
            .ok_or_else(|| TimeError::InvalidFormat(datetime.to_string()))?;

        if tp == TimeType::Date {
            datetime = datetime
                .date()
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| TimeError::InvalidFormat(datetime.to_string()))?;
        }

        if tp == TimeType::Timestamp {
            let secs = Utc.from_utc_datetime(&datetime).timestamp();
            if !(MIN_TIMESTAMP_SECS..=MAX_TIMESTAMP_SECS).contains(&secs) {
                return Err(TimeError::TimestampOutOfRange(datetime.to_string()));
            }
        }

        Ok(Self {
            datetime: Some(datetime),
            tp,
            fsp: if tp == TimeType::Date { 0 } else { fsp },
        })
    }

    /// Builds a time from seconds since the Unix epoch (UTC).
    pub fn from_unix(secs: i64, tp: TimeType, fsp: u8) -> Result<Self, TimeError> {
        let datetime = DateTime::from_timestamp(secs, 0)
            .ok_or(TimeError::InvalidNumber(secs))?
            .naive_utc();
        Self::new(datetime, tp, fsp)
    }

    pub fn is_zero(&self) -> bool {
        self.datetime.is_none()
    }

    pub fn time_type(&self) -> TimeType {
        self.tp
    }

    pub fn fsp(&self) -> u8 {
        self.fsp
    }

    /// The calendar instant, or `None` for the zero value.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        self.datetime
    }

    /// Re-tags this value with another type and precision.
    pub fn convert(&self, tp: TimeType, fsp: u8) -> Result<Self, TimeError> {
        match self.datetime {
            None => Ok(Self::zero(tp, fsp)),
            Some(datetime) => Self::new(datetime, tp, fsp),
        }
    }

    /// Numeric form: `YYYYMMDD` for dates, `YYYYMMDDHHMMSS` otherwise.
    pub fn to_packed_i64(&self) -> i64 {
        let Some(datetime) = self.datetime else {
            return 0;
        };
        let date = datetime.year() as i64 * 10_000
            + datetime.month() as i64 * 100
            + datetime.day() as i64;
        if self.tp == TimeType::Date {
            return date;
        }
        date * 1_000_000
            + datetime.hour() as i64 * 10_000
            + datetime.minute() as i64 * 100
            + datetime.second() as i64
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (date, clock, nanos) = match self.datetime {
            None => (
                "0000-00-00".to_string(),
                "00:00:00".to_string(),
                0u32,
            ),
            Some(datetime) => (
                datetime.format("%Y-%m-%d").to_string(),
                datetime.format("%H:%M:%S").to_string(),
                datetime.nanosecond(),
            ),
        };

        if self.tp == TimeType::Date {
            return write!(f, "{}", date);
        }
        write!(f, "{} {}", date, clock)?;
        if self.fsp > 0 {
            let digits = nanos / 10u32.pow(9 - self.fsp as u32);
            write!(f, ".{:0width$}", digits, width = self.fsp as usize)?;
        }
        Ok(())
    }
}

fn round_to_fsp(datetime: NaiveDateTime, fsp: u8) -> Option<NaiveDateTime> {
    let unit = 10i64.pow(9 - fsp as u32);
    let nanos = datetime.nanosecond() as i64;
    let rounded = (nanos + unit / 2) / unit * unit;
    datetime
        .with_nanosecond(0)?
        .checked_add_signed(chrono::Duration::nanoseconds(rounded))
}

/// True for literals made only of zero digits and separators, such as
/// `0000-00-00` or `0000-00-00 00:00:00.000`.
fn is_zero_literal(s: &str) -> bool {
    let mut digits = s.chars().filter(|c| c.is_ascii_digit()).peekable();
    digits.peek().is_some()
        && digits.all(|c| c == '0')
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | ':' | ' ' | '.' | '/' | 'T'))
}

/// Parses a time literal such as `2024-03-01 12:30:45.123` into type `tp`.
pub fn parse_time(s: &str, tp: TimeType, fsp: i32) -> Result<Time, TimeError> {
    let fsp = check_fsp(fsp)?;
    let trimmed = s.trim();

    if is_zero_literal(trimmed) {
        return Ok(Time::zero(tp, fsp));
    }

    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = trimmed.parse::<i64>() {
            return parse_time_from_num(n, tp, fsp as i32)
                .map_err(|_| TimeError::InvalidFormat(s.to_string()));
        }
    }

    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for format in &DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Time::new(datetime, tp, fsp);
        }
    }

    for format in &["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            let datetime = date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| TimeError::InvalidFormat(s.to_string()))?;
            return Time::new(datetime, tp, fsp);
        }
    }

    Err(TimeError::InvalidFormat(s.to_string()))
}

/// Parses a numeric-encoded time: `YYMMDD`, `YYYYMMDD`, `YYMMDDHHMMSS` or
/// `YYYYMMDDHHMMSS`. Zero is the zero value; two-digit years `00..69` map to
/// `2000..2069` and `70..99` to `1970..1999`.
pub fn parse_time_from_num(num: i64, tp: TimeType, fsp: i32) -> Result<Time, TimeError> {
    let fsp = check_fsp(fsp)?;
    if num == 0 {
        return Ok(Time::zero(tp, fsp));
    }

    let invalid = || TimeError::InvalidNumber(num);
    let packed = match num {
        n if n < 101 => return Err(invalid()),
        n if n <= (YY_PART_YEAR - 1) * 10_000 + 1231 => (n + 20_000_000) * 1_000_000,
        n if n < YY_PART_YEAR * 10_000 + 101 => return Err(invalid()),
        n if n <= 991_231 => (n + 19_000_000) * 1_000_000,
        n if n < 10_000_101 => return Err(invalid()),
        n if n <= 99_991_231 => n * 1_000_000,
        n if n < 101_000_000 => return Err(invalid()),
        n if n <= (YY_PART_YEAR - 1) * 10_000_000_000 + 1_231_235_959 => n + 20_000_000_000_000,
        n if n < YY_PART_YEAR * 10_000_000_000 + 101_000_000 => return Err(invalid()),
        n if n <= 991_231_235_959 => n + 19_000_000_000_000,
        n if n <= 99_991_231_235_959 => n,
        _ => return Err(invalid()),
    };

    let ymd = packed / 1_000_000;
    let hms = packed % 1_000_000;
    let datetime = NaiveDate::from_ymd_opt(
        (ymd / 10_000) as i32,
        (ymd / 100 % 100) as u32,
        (ymd % 100) as u32,
    )
    .and_then(|date| {
        date.and_hms_opt(
            (hms / 10_000) as u32,
            (hms / 100 % 100) as u32,
            (hms % 100) as u32,
        )
    })
    .ok_or_else(invalid)?;

    Time::new(datetime, tp, fsp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_check_fsp() {
        assert_eq!(check_fsp(UNSPECIFIED_FSP).unwrap(), DEFAULT_FSP);
        assert_eq!(check_fsp(3).unwrap(), 3);
        assert_eq!(check_fsp(7), Err(TimeError::InvalidFsp(7)));
        assert_eq!(check_fsp(-2), Err(TimeError::InvalidFsp(-2)));
    }

    #[test]
    fn test_zero_time_display() {
        assert_eq!(Time::zero(TimeType::Datetime, 0).to_string(), "0000-00-00 00:00:00");
        assert_eq!(Time::zero(TimeType::Date, 0).to_string(), "0000-00-00");
        assert_eq!(
            Time::zero(TimeType::Timestamp, 3).to_string(),
            "0000-00-00 00:00:00.000"
        );
    }

    #[test]
    fn test_parse_time_literals() {
        let t = parse_time("2024-03-01 12:30:45", TimeType::Datetime, 0).unwrap();
        assert_eq!(t.datetime(), Some(datetime(2024, 3, 1, 12, 30, 45)));
        assert_eq!(t.to_string(), "2024-03-01 12:30:45");

        let t = parse_time("2024-03-01 12:30:45.123456", TimeType::Datetime, 3).unwrap();
        assert_eq!(t.to_string(), "2024-03-01 12:30:45.123");

        let t = parse_time("2024-03-01 12:30:45.9999", TimeType::Datetime, 0).unwrap();
        assert_eq!(t.to_string(), "2024-03-01 12:30:46");

        let t = parse_time("2024-03-01 12:30:45", TimeType::Date, 0).unwrap();
        assert_eq!(t.to_string(), "2024-03-01");

        let t = parse_time("2024-03-01", TimeType::Datetime, 0).unwrap();
        assert_eq!(t.to_string(), "2024-03-01 00:00:00");

        let t = parse_time("20240301123045", TimeType::Datetime, 0).unwrap();
        assert_eq!(t.to_string(), "2024-03-01 12:30:45");

        assert!(parse_time("0000-00-00 00:00:00", TimeType::Datetime, 0)
            .unwrap()
            .is_zero());
        assert!(parse_time("0000-00-00", TimeType::Date, 0).unwrap().is_zero());
    }

    #[test]
    fn test_parse_time_errors() {
        assert!(matches!(
            parse_time("not a time", TimeType::Datetime, 0),
            Err(TimeError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_time("2024-13-01", TimeType::Datetime, 0),
            Err(TimeError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_time("2024-01-01", TimeType::Datetime, 9),
            Err(TimeError::InvalidFsp(9))
        ));
        assert!(matches!(
            parse_time("2040-01-01 00:00:00", TimeType::Timestamp, 0),
            Err(TimeError::TimestampOutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_time_from_num() {
        let t = parse_time_from_num(20240301, TimeType::Datetime, 0).unwrap();
        assert_eq!(t.to_string(), "2024-03-01 00:00:00");

        let t = parse_time_from_num(240301, TimeType::Date, 0).unwrap();
        assert_eq!(t.to_string(), "2024-03-01");

        let t = parse_time_from_num(990301, TimeType::Date, 0).unwrap();
        assert_eq!(t.to_string(), "1999-03-01");

        let t = parse_time_from_num(20240301123045, TimeType::Datetime, 0).unwrap();
        assert_eq!(t.to_string(), "2024-03-01 12:30:45");

        let t = parse_time_from_num(240301123045, TimeType::Datetime, 0).unwrap();
        assert_eq!(t.to_string(), "2024-03-01 12:30:45");

        assert!(parse_time_from_num(0, TimeType::Timestamp, 2).unwrap().is_zero());
    }

    #[test]
    fn test_parse_time_from_num_errors() {
        assert_eq!(
            parse_time_from_num(-1, TimeType::Datetime, 0),
            Err(TimeError::InvalidNumber(-1))
        );
        assert_eq!(
            parse_time_from_num(100, TimeType::Datetime, 0),
            Err(TimeError::InvalidNumber(100))
        );
        assert_eq!(
            parse_time_from_num(20241301, TimeType::Datetime, 0),
            Err(TimeError::InvalidNumber(20241301))
        );
        assert_eq!(
            parse_time_from_num(695000, TimeType::Datetime, 0),
            Err(TimeError::InvalidNumber(695000))
        );
    }

    #[test]
    fn test_from_unix_and_packed() {
        let t = Time::from_unix(1_700_000_000, TimeType::Timestamp, 0).unwrap();
        assert_eq!(t.to_string(), "2023-11-14 22:13:20");
        assert_eq!(t.to_packed_i64(), 20231114221320);

        let d = t.convert(TimeType::Date, 0).unwrap();
        assert_eq!(d.to_packed_i64(), 20231114);
        assert_eq!(Time::zero(TimeType::Date, 0).to_packed_i64(), 0);
    }
}
