//! Constant folding.
//!
//! An expression is static when its value depends only on its own literal
//! content: no columns, no session state, no subqueries and no parameters.
//! Static expressions can be evaluated once during planning and replaced by
//! the resulting [`Value`].

use crate::context::Environment;
use crate::expression::eval::ExpressionEvaluator;
use crate::expression::{Expression, ExpressionResult};
use crate::function::FunctionRegistry;
use crate::types::Value;

/// Whether `expr` can be folded, resolving calls against the builtin functions.
pub fn is_static(expr: &Expression) -> bool {
    is_static_with(expr, FunctionRegistry::builtin())
}

pub fn is_static_with(expr: &Expression, functions: &FunctionRegistry) -> bool {
    match expr {
        Expression::Value(_) => true,
        Expression::Ident(_)
        | Expression::ParamMarker { .. }
        | Expression::SubQuery(_)
        | Expression::ExistsSubQuery { .. }
        | Expression::CompareSubQuery { .. }
        | Expression::Default { .. }
        | Expression::Variable { .. }
        | Expression::Position { .. }
        | Expression::Values { .. } => false,
        Expression::UnaryOperation { op, operand } => {
            op.is_sign() && is_static_with(operand, functions)
        }
        Expression::Call { name, args, .. } => {
            let foldable = functions
                .lookup(name)
                .is_some_and(|f| f.is_static && !f.is_aggregate);
            foldable && args.iter().all(|arg| is_static_with(arg, functions))
        }
        Expression::BinaryOperation { .. }
        | Expression::PExpr(_)
        | Expression::PatternIn { .. }
        | Expression::PatternLike { .. }
        | Expression::IsNull { .. }
        | Expression::IsTruth { .. }
        | Expression::Between { .. }
        | Expression::Row { .. }
        | Expression::FunctionCast { .. }
        | Expression::FunctionConvert { .. }
        | Expression::FunctionSubstring { .. }
        | Expression::FunctionCase { .. }
        | Expression::WhenClause(_) => expr
            .children()
            .into_iter()
            .all(|child| is_static_with(child, functions)),
    }
}

/// Folds a single node. A static expression becomes a `Value`; anything
/// else is returned unchanged. Children are not visited; see
/// [`fold_constants`] for a whole-tree rewrite.
pub fn fold_static(expr: Expression) -> ExpressionResult<Expression> {
    fold_static_with(expr, FunctionRegistry::builtin())
}

pub fn fold_static_with(
    expr: Expression,
    functions: &FunctionRegistry,
) -> ExpressionResult<Expression> {
    if matches!(expr, Expression::Value(_)) || !is_static_with(&expr, functions) {
        return Ok(expr);
    }
    let value = evaluate_static(&expr, functions)?;
    log::debug!("folded {} to {}", expr, value);
    Ok(Expression::Value(value))
}

fn evaluate_static(expr: &Expression, functions: &FunctionRegistry) -> ExpressionResult<Value> {
    let env = Environment::new();
    ExpressionEvaluator::new(None, &env)
        .with_functions(functions)
        .evaluate(expr)
}

/// Replaces every maximal static subtree of `expr` with its value.
///
/// A static subtree is evaluated as a whole, so AND, OR and CASE
/// short-circuit exactly as they do at run time. An error is returned only
/// when `expr` itself is static and fails; a failing subtree under a
/// non-static parent is left in place for the evaluator to report.
pub fn fold_constants(expr: &mut Expression) -> ExpressionResult<()> {
    fold_constants_with(expr, FunctionRegistry::builtin())
}

pub fn fold_constants_with(
    expr: &mut Expression,
    functions: &FunctionRegistry,
) -> ExpressionResult<()> {
    if is_static_with(expr, functions) {
        if !matches!(expr, Expression::Value(_)) {
            let value = evaluate_static(expr, functions)?;
            log::debug!("folded {} to {}", expr, value);
            *expr = Expression::Value(value);
        }
        return Ok(());
    }
    for child in expr.children_mut() {
        fold_subtree(child, functions);
    }
    Ok(())
}

fn fold_subtree(expr: &mut Expression, functions: &FunctionRegistry) {
    if !is_static_with(expr, functions) {
        for child in expr.children_mut() {
            fold_subtree(child, functions);
        }
        return;
    }
    if matches!(expr, Expression::Value(_)) {
        return;
    }
    match evaluate_static(expr, functions) {
        Ok(value) => {
            log::debug!("folded {} to {}", expr, value);
            *expr = Expression::Value(value);
        }
        Err(err) => log::debug!("left {} unfolded: {}", expr, err),
    }
}

/// Cheap evaluation of literals and signed literals, such as `-1`, without
/// a context. Returns `None` for anything else or on failure.
pub fn fast_eval(expr: &Expression) -> Option<Value> {
    match expr {
        Expression::Value(value) => Some(value.clone()),
        Expression::UnaryOperation { op, operand }
            if op.is_sign() && matches!(operand.as_ref(), Expression::Value(_)) =>
        {
            evaluate_static(expr, FunctionRegistry::builtin()).ok()
        }
        _ => None,
    }
}
