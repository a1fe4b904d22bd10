//! Normalization of time-valued defaults.
//!
//! Column defaults for `DATE`, `DATETIME` and `TIMESTAMP` arrive in several
//! shapes: a keyword, a literal string, a number, a signed literal such as
//! `-1`, or an identifier. [`get_time_value`] turns them into one canonical
//! [`Value`].

use crate::context::{Context, Environment, TIMESTAMP_VAR};
use crate::expression::eval::evaluate_expression;
use crate::expression::{Expression, ExpressionError, ExpressionResult};
use crate::types::{
    convert, parse_time, parse_time_from_num, time::check_fsp, FieldType, Time, TimeType, Value,
};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Keyword for the current instant.
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

/// The all-zero time literal.
pub const ZERO_TIMESTAMP: &str = "0000-00-00 00:00:00";

/// The expression the parser produces for a bare `CURRENT_TIMESTAMP`.
pub fn current_time_expr() -> Expression {
    Expression::ident(CURRENT_TIMESTAMP)
}

/// True iff `expr` is the `CURRENT_TIMESTAMP` identifier.
pub fn is_current_time_expr(expr: &Expression) -> bool {
    matches!(expr, Expression::Ident(ident) if ident.name.eq_ignore_ascii_case(CURRENT_TIMESTAMP))
}

/// The session's notion of "now", in UTC.
///
/// A positive `timestamp` session variable pins the instant to that many
/// seconds since the epoch. An empty or non-positive override means the
/// real clock; one that is not an integer is an error.
pub fn system_timestamp(ctx: Option<&dyn Context>) -> ExpressionResult<NaiveDateTime> {
    let now = Utc::now().naive_utc();
    let Some(value) = ctx.and_then(|ctx| ctx.session_variable(TIMESTAMP_VAR)) else {
        return Ok(now);
    };
    if value.is_empty() {
        return Ok(now);
    }

    let secs: i64 = value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ExpressionError::InvalidTimestampOverride {
            value: value.clone(),
            reason: e.to_string(),
        })?;
    if secs <= 0 {
        log::warn!("ignoring non-positive session timestamp {}", secs);
        return Ok(now);
    }

    DateTime::from_timestamp(secs, 0)
        .map(|t| t.naive_utc())
        .ok_or_else(|| ExpressionError::InvalidTimestampOverride {
            value,
            reason: "out of range".to_string(),
        })
}

/// Raw input accepted by [`get_time_value`]
#[derive(Debug, Clone, Copy)]
pub enum TimeSource<'a> {
    Literal(&'a str),
    Expr(&'a Expression),
}

impl<'a> From<&'a str> for TimeSource<'a> {
    fn from(s: &'a str) -> Self {
        TimeSource::Literal(s)
    }
}

impl<'a> From<&'a Expression> for TimeSource<'a> {
    fn from(expr: &'a Expression) -> Self {
        TimeSource::Expr(expr)
    }
}

/// Normalizes a time default into a value of type `tp` with precision `fsp`.
///
/// The result is a `Value::Time`, `Value::Null`, or, for the
/// `CURRENT_TIMESTAMP` identifier, the keyword itself as a string so the
/// caller can resolve it per row.
pub fn get_time_value<'a>(
    ctx: Option<&dyn Context>,
    source: impl Into<TimeSource<'a>>,
    tp: TimeType,
    fsp: i32,
) -> ExpressionResult<Value> {
    match source.into() {
        TimeSource::Literal(s) => time_from_literal(ctx, s, tp, fsp),
        TimeSource::Expr(expr) => time_from_expr(ctx, expr, tp, fsp),
    }
}

fn time_from_literal(
    ctx: Option<&dyn Context>,
    s: &str,
    tp: TimeType,
    fsp: i32,
) -> ExpressionResult<Value> {
    if s == CURRENT_TIMESTAMP {
        let fsp = check_fsp(fsp)?;
        let now = system_timestamp(ctx)?;
        return Ok(Value::Time(Time::new(now, tp, fsp)?));
    }
    if s == ZERO_TIMESTAMP {
        return Ok(Value::Time(Time::zero(tp, check_fsp(fsp)?)));
    }
    Ok(Value::Time(parse_time(s, tp, fsp)?))
}

fn time_from_expr(
    ctx: Option<&dyn Context>,
    expr: &Expression,
    tp: TimeType,
    fsp: i32,
) -> ExpressionResult<Value> {
    match expr {
        Expression::Value(value) => match value {
            Value::String(s) => Ok(Value::Time(parse_time(s, tp, fsp)?)),
            Value::Int64(n) => Ok(Value::Time(parse_time_from_num(*n, tp, fsp)?)),
            Value::Null => Ok(Value::Null),
            _ => Err(ExpressionError::InvalidDefaultValue),
        },
        Expression::Ident(_) if is_current_time_expr(expr) => {
            Ok(Value::String(CURRENT_TIMESTAMP.to_string()))
        }
        Expression::Ident(_) => Err(ExpressionError::InvalidDefaultValue),
        Expression::UnaryOperation { .. } => {
            let value = evaluate_expression(expr, ctx, &Environment::new())?;
            match convert(&value, &FieldType::Longlong)? {
                Value::Int64(n) => Ok(Value::Time(parse_time_from_num(n, tp, fsp)?)),
                _ => Ok(Value::Null),
            }
        }
        _ => Ok(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionContext;
    use crate::types::TimeError;

    fn pinned_session() -> SessionContext {
        let ctx = SessionContext::new();
        ctx.set_system_var("timestamp", "1700000000");
        ctx
    }

    #[test]
    fn test_current_time_expr() {
        assert!(is_current_time_expr(&current_time_expr()));
        assert!(is_current_time_expr(&Expression::ident("current_timestamp")));
        assert!(!is_current_time_expr(&Expression::ident("c1")));
        assert!(!is_current_time_expr(&Expression::value(CURRENT_TIMESTAMP)));
    }

    #[test]
    fn test_system_timestamp_override() {
        let ctx = pinned_session();
        let ts = system_timestamp(Some(&ctx)).unwrap();
        assert_eq!(ts.to_string(), "2023-11-14 22:13:20");

        ctx.set_system_var("timestamp", "abc");
        assert!(matches!(
            system_timestamp(Some(&ctx)),
            Err(ExpressionError::InvalidTimestampOverride { .. })
        ));

        // Non-positive and empty overrides fall back to the clock.
        let before = Utc::now().naive_utc();
        ctx.set_system_var("timestamp", "0");
        assert!(system_timestamp(Some(&ctx)).unwrap() >= before);
        ctx.set_system_var("timestamp", "");
        assert!(system_timestamp(Some(&ctx)).unwrap() >= before);
        assert!(system_timestamp(None).unwrap() >= before);
    }

    #[test]
    fn test_literal_sources() {
        let ctx = pinned_session();

        let value = get_time_value(Some(&ctx), "CURRENT_TIMESTAMP", TimeType::Timestamp, 0).unwrap();
        assert_eq!(value.to_string(), "'2023-11-14 22:13:20'");

        let value = get_time_value(Some(&ctx), CURRENT_TIMESTAMP, TimeType::Date, 0).unwrap();
        assert_eq!(value.to_string(), "'2023-11-14'");

        // Only the exact keyword resolves; other spellings are parsed as literals.
        assert!(matches!(
            get_time_value(Some(&ctx), "current_timestamp", TimeType::Datetime, 0),
            Err(ExpressionError::Time(TimeError::InvalidFormat(_)))
        ));

        let value = get_time_value(None, ZERO_TIMESTAMP, TimeType::Datetime, 2).unwrap();
        assert_eq!(value.to_string(), "'0000-00-00 00:00:00.00'");

        let value = get_time_value(None, "2024-03-01 10:20:30", TimeType::Datetime, 0).unwrap();
        assert_eq!(value.to_string(), "'2024-03-01 10:20:30'");

        assert!(matches!(
            get_time_value(None, "yesterday", TimeType::Datetime, 0),
            Err(ExpressionError::Time(TimeError::InvalidFormat(_)))
        ));
        assert!(matches!(
            get_time_value(Some(&ctx), CURRENT_TIMESTAMP, TimeType::Datetime, 7),
            Err(ExpressionError::Time(TimeError::InvalidFsp(7)))
        ));
    }

    #[test]
    fn test_zero_literal_ignores_session() {
        let ctx = SessionContext::new();
        ctx.set_system_var("timestamp", "not a number");
        let value = get_time_value(Some(&ctx), ZERO_TIMESTAMP, TimeType::Timestamp, 0).unwrap();
        assert!(matches!(value, Value::Time(t) if t.is_zero()));
    }

    #[test]
    fn test_expression_sources() {
        let value = get_time_value(
            None,
            &Expression::value("2024-03-01"),
            TimeType::Date,
            0,
        )
        .unwrap();
        assert_eq!(value.to_string(), "'2024-03-01'");

        let value = get_time_value(None, &Expression::value(20240301i64), TimeType::Datetime, 0).unwrap();
        assert_eq!(value.to_string(), "'2024-03-01 00:00:00'");

        assert_eq!(
            get_time_value(None, &Expression::null(), TimeType::Datetime, 0).unwrap(),
            Value::Null
        );
        assert_eq!(
            get_time_value(None, &Expression::value(1.5f64), TimeType::Datetime, 0),
            Err(ExpressionError::InvalidDefaultValue)
        );

        assert_eq!(
            get_time_value(None, &current_time_expr(), TimeType::Datetime, 0).unwrap(),
            Value::from(CURRENT_TIMESTAMP)
        );
        assert_eq!(
            get_time_value(None, &Expression::ident("c1"), TimeType::Datetime, 0),
            Err(ExpressionError::InvalidDefaultValue)
        );

        assert_eq!(
            get_time_value(None, &Expression::negative(1i64), TimeType::Datetime, 0),
            Err(ExpressionError::Time(TimeError::InvalidNumber(-1)))
        );

        let unmatched = Expression::plus(Expression::value(1i64), Expression::value(2i64));
        assert_eq!(
            get_time_value(None, &unmatched, TimeType::Datetime, 0).unwrap(),
            Value::Null
        );
    }
}
