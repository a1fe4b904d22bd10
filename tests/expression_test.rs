use anyhow::Result;
use sqlexpr::context::{Environment, SessionContext};
use sqlexpr::expression::{
    check_all_one_columns, column_count, contains_aggregate_func, evaluate_expression,
    fold_constants, fold_static, get_time_value, has_same_column_count, is_static,
    mentioned_aggregate_funcs, mentioned_columns, unwrap_parentheses, BinaryOperator, Expression,
    ExpressionError, WhenClause, CURRENT_TIMESTAMP, ZERO_TIMESTAMP,
};
use sqlexpr::types::{FieldType, TimeError, TimeType, Value};
use std::sync::Arc;
use std::thread;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn int(v: i64) -> Expression {
    Expression::value(v)
}

fn sample_expressions() -> Vec<Expression> {
    vec![
        int(1),
        Expression::ident("t.c1"),
        Expression::plus(int(1), int(2)),
        Expression::eq(Expression::null(), int(1)),
        Expression::negative(4i64),
        Expression::call("upper", vec![Expression::value("abc")]),
        Expression::in_list(Expression::ident("c1"), vec![int(1), int(2)], true),
        Expression::like(Expression::value("abc"), Expression::value("a%"), false),
        Expression::between(int(3), int(1), int(5), false),
        Expression::case(
            None,
            vec![WhenClause::new(Expression::lt(int(1), int(2)), Expression::value("y"))],
            Some(Expression::value("n")),
        ),
        Expression::cast(Expression::value("2024-03-01"), FieldType::Date),
        Expression::subquery("select 1"),
        Expression::call("count", vec![Expression::ident("c1")]),
    ]
}

#[test]
fn test_end_to_end_evaluation() -> Result<()> {
    init_logger();
    let env = Environment::new();

    let value = evaluate_expression(&Expression::plus(int(1), int(2)), None, &env)?;
    assert_eq!(value, Value::Int64(3));

    let value = evaluate_expression(&Expression::eq(Expression::null(), int(1)), None, &env)?;
    assert_eq!(value, Value::Null);
    Ok(())
}

#[test]
fn test_unwrap_inverts_parenthesize() {
    for expr in sample_expressions() {
        let wrapped = Expression::paren(expr.clone());
        assert_eq!(unwrap_parentheses(&wrapped), &expr);

        let twice = Expression::paren(Expression::paren(expr.clone()));
        let once = unwrap_parentheses(&twice);
        assert_eq!(unwrap_parentheses(once), once);
    }
}

#[test]
fn test_fold_agrees_with_evaluation() -> Result<()> {
    init_logger();
    let env = Environment::new();

    for expr in sample_expressions() {
        if is_static(&expr) {
            let expected = evaluate_expression(&expr, None, &env)?;
            let folded = fold_static(expr)?;
            assert_eq!(folded, Expression::Value(expected));
            assert_eq!(fold_static(folded.clone())?, folded);
        } else {
            assert_eq!(fold_static(expr.clone())?, expr);
        }
    }
    Ok(())
}

#[test]
fn test_fold_constants_keeps_column_references() -> Result<()> {
    let mut expr = Expression::and(
        Expression::gt(Expression::ident("price"), Expression::mul(int(2), int(50))),
        Expression::like(
            Expression::ident("name"),
            Expression::call("concat", vec![Expression::value("a"), Expression::value("%")]),
            false,
        ),
    );
    fold_constants(&mut expr)?;

    let expected = Expression::and(
        Expression::gt(Expression::ident("price"), int(100)),
        Expression::like(Expression::ident("name"), Expression::value("a%"), false),
    );
    assert_eq!(expr, expected);
    assert_eq!(mentioned_columns(&expr), vec!["price", "name"]);
    Ok(())
}

#[test]
fn test_row_arity() -> Result<()> {
    for n in 2..6 {
        let row = Expression::row((0..n).map(|i| int(i)).collect())?;
        assert_eq!(column_count(None, &row)?, n as usize);
    }
    assert_eq!(Expression::row(vec![]), Err(ExpressionError::RowTooShort));
    assert_eq!(Expression::row(vec![int(1)]), Err(ExpressionError::RowTooShort));
    Ok(())
}

#[test]
fn test_single_column_requirement() -> Result<()> {
    let scalar = int(1);
    let column = Expression::ident("c1");
    let row = Expression::row(vec![int(1), int(2)])?;

    check_all_one_columns(None, [&scalar, &column])?;
    assert_eq!(
        check_all_one_columns(None, [&scalar, &row]),
        Err(ExpressionError::OperandColumns { expected: 1 })
    );

    let ctx = SessionContext::new();
    ctx.register_subquery("select a, b from t", 2, vec![]);
    let subquery = Expression::subquery("select a, b from t");
    assert!(check_all_one_columns(Some(&ctx), [&subquery]).is_err());
    has_same_column_count(Some(&ctx), &row, [&subquery])?;
    Ok(())
}

#[test]
fn test_aggregate_classification() -> Result<()> {
    init_logger();

    let plain = Expression::plus(Expression::ident("c1"), int(1));
    assert!(mentioned_aggregate_funcs(&plain).aggregates.is_empty());
    assert!(!contains_aggregate_func(&plain));

    let nested = Expression::call(
        "count",
        vec![Expression::call("max", vec![Expression::ident("c1")])],
    );
    let aggregates = mentioned_aggregate_funcs(&nested).into_result()?;
    assert_eq!(aggregates, vec![&nested]);
    assert!(contains_aggregate_func(&nested));

    let unknown = Expression::call("mystery", vec![Expression::ident("c1")]);
    let scan = mentioned_aggregate_funcs(&unknown);
    assert!(scan.aggregates.is_empty());
    assert_eq!(
        scan.into_result(),
        Err(ExpressionError::UnknownFunction {
            name: "mystery".to_string()
        })
    );
    Ok(())
}

#[test]
fn test_zero_timestamp_is_context_independent() -> Result<()> {
    let pinned = SessionContext::new();
    pinned.set_system_var("timestamp", "1700000000");

    for tp in [TimeType::Date, TimeType::Datetime, TimeType::Timestamp] {
        for fsp in 0..=6 {
            for ctx in [None, Some(&pinned)] {
                let ctx = ctx.map(|c| c as &dyn sqlexpr::Context);
                let value = get_time_value(ctx, ZERO_TIMESTAMP, tp, fsp)?;
                assert!(matches!(value, Value::Time(t) if t.is_zero() && t.time_type() == tp));
            }
        }
    }
    Ok(())
}

#[test]
fn test_current_timestamp_override() -> Result<()> {
    let ctx = SessionContext::new();
    ctx.set_system_var("timestamp", "1700000000");

    let value = get_time_value(Some(&ctx), CURRENT_TIMESTAMP, TimeType::Datetime, 0)?;
    assert_eq!(value.to_string(), "'2023-11-14 22:13:20'");

    let value = get_time_value(Some(&ctx), CURRENT_TIMESTAMP, TimeType::Datetime, 3)?;
    assert_eq!(value.to_string(), "'2023-11-14 22:13:20.000'");
    Ok(())
}

#[test]
fn test_negative_numeric_default_fails() {
    let result = get_time_value(None, &Expression::negative(1i64), TimeType::Datetime, 0);
    assert_eq!(result, Err(ExpressionError::Time(TimeError::InvalidNumber(-1))));
}

#[test]
fn test_session_shared_across_threads() -> Result<()> {
    let ctx = Arc::new(SessionContext::new());
    ctx.set_user_var("limit", Value::Int64(10));
    let expr = Arc::new(Expression::lt(
        Expression::variable("i", false, false),
        Expression::variable("limit", false, false),
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ctx = Arc::clone(&ctx);
            let expr = Arc::clone(&expr);
            thread::spawn(move || {
                // Each thread reads the shared limit; `i` is never set
                let session: &dyn sqlexpr::Context = &*ctx;
                let value = evaluate_expression(&expr, Some(session), &Environment::new());
                (i, value)
            })
        })
        .collect();

    for handle in handles {
        let (_, value) = handle.join().expect("thread panicked");
        assert_eq!(value?, Value::Null);
    }
    Ok(())
}

#[test]
fn test_expression_serde() -> Result<()> {
    let expr = Expression::compare_subquery(
        BinaryOperator::Ge,
        Expression::cast(Expression::ident("d"), FieldType::Datetime(2)),
        "select d from t",
        true,
    );
    let json = serde_json::to_string(&expr)?;
    let decoded: Expression = serde_json::from_str(&json)?;
    assert_eq!(decoded, expr);
    Ok(())
}
