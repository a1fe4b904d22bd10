//! Column arity checks.
//!
//! Comparisons and `IN` lists require their operands to agree on how many
//! columns they yield. Scalars yield one, row constructors yield their
//! length and subqueries yield whatever the resolver reports.

use crate::context::Context;
use crate::expression::{Expression, ExpressionError, ExpressionResult};
use crate::types::Value;

/// Number of columns `expr` yields.
pub fn column_count(ctx: Option<&dyn Context>, expr: &Expression) -> ExpressionResult<usize> {
    match expr {
        Expression::Row { values } => row_width(values.len()),
        // A folded row constructor keeps its width.
        Expression::Value(Value::Row(values)) => row_width(values.len()),
        Expression::SubQuery(query) => match ctx {
            Some(ctx) => ctx.subquery_column_count(query),
            None => Err(ExpressionError::UnresolvedSubquery {
                query: query.text.clone(),
            }),
        },
        _ => Ok(1),
    }
}

fn row_width(len: usize) -> ExpressionResult<usize> {
    if len < 2 {
        return Err(ExpressionError::RowTooShort);
    }
    Ok(len)
}

/// Fails unless `expr` yields exactly one column.
pub fn check_one_column(ctx: Option<&dyn Context>, expr: &Expression) -> ExpressionResult<()> {
    if column_count(ctx, expr)? != 1 {
        return Err(ExpressionError::OperandColumns { expected: 1 });
    }
    Ok(())
}

/// [`check_one_column`] over every operand, stopping at the first failure.
pub fn check_all_one_columns<'e, I>(ctx: Option<&dyn Context>, exprs: I) -> ExpressionResult<()>
where
    I: IntoIterator<Item = &'e Expression>,
{
    for expr in exprs {
        check_one_column(ctx, expr)?;
    }
    Ok(())
}

/// Requires every operand to yield as many columns as `reference`.
pub fn has_same_column_count<'e, I>(
    ctx: Option<&dyn Context>,
    reference: &Expression,
    operands: I,
) -> ExpressionResult<()>
where
    I: IntoIterator<Item = &'e Expression>,
{
    let expected = column_count(ctx, reference)?;
    for expr in operands {
        if column_count(ctx, expr)? != expected {
            return Err(ExpressionError::OperandColumns { expected });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionContext;

    fn row(n: i64) -> Expression {
        Expression::row((0..n).map(|i| Expression::value(i)).collect()).unwrap()
    }

    #[test]
    fn test_column_count() {
        assert_eq!(column_count(None, &Expression::value(1i64)).unwrap(), 1);
        assert_eq!(column_count(None, &Expression::ident("c1")).unwrap(), 1);
        assert_eq!(column_count(None, &row(2)).unwrap(), 2);
        assert_eq!(column_count(None, &row(5)).unwrap(), 5);
        assert_eq!(
            column_count(None, &Expression::value(Value::Row(vec![Value::Null; 3]))).unwrap(),
            3
        );

        let short = Expression::Row {
            values: vec![Expression::value(1i64)],
        };
        assert_eq!(column_count(None, &short), Err(ExpressionError::RowTooShort));
    }

    #[test]
    fn test_subquery_column_count() {
        let query = Expression::subquery("select a, b from t");
        assert!(matches!(
            column_count(None, &query),
            Err(ExpressionError::UnresolvedSubquery { .. })
        ));

        let ctx = SessionContext::new();
        assert!(matches!(
            column_count(Some(&ctx), &query),
            Err(ExpressionError::UnresolvedSubquery { .. })
        ));

        ctx.register_subquery("select a, b from t", 2, vec![]);
        assert_eq!(column_count(Some(&ctx), &query).unwrap(), 2);
        assert_eq!(
            check_one_column(Some(&ctx), &query),
            Err(ExpressionError::OperandColumns { expected: 1 })
        );
    }

    #[test]
    fn test_check_all_one_columns() {
        let a = Expression::value(1i64);
        let b = Expression::ident("c1");
        assert!(check_all_one_columns(None, [&a, &b]).is_ok());
        assert!(check_all_one_columns(None, Vec::<&Expression>::new()).is_ok());

        let r = row(2);
        assert_eq!(
            check_all_one_columns(None, [&a, &r, &b]),
            Err(ExpressionError::OperandColumns { expected: 1 })
        );
    }

    #[test]
    fn test_has_same_column_count() {
        let list = vec![row(2), row(2)];
        assert!(has_same_column_count(None, &row(2), &list).is_ok());

        let list = vec![row(2), row(3)];
        let err = has_same_column_count(None, &row(2), &list).unwrap_err();
        assert_eq!(err, ExpressionError::OperandColumns { expected: 2 });
        assert_eq!(err.to_string(), "Operand should contain 2 column(s)");

        let list = vec![Expression::value(1i64)];
        assert_eq!(
            has_same_column_count(None, &row(3), &list),
            Err(ExpressionError::OperandColumns { expected: 3 })
        );
    }
}
