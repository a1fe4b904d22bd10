//! Aggregate function detection.
//!
//! The planner needs the aggregate call sites of select-list and HAVING
//! expressions to build the aggregation step. Arguments of an aggregate call
//! are not searched, so `count(max(c1))` reports only the outer call; nested
//! aggregates are left for a later validation pass to reject.

use crate::expression::{Expression, ExpressionError, ExpressionResult};
use crate::function::FunctionRegistry;

/// Outcome of scanning an expression for aggregate calls
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateScan<'a> {
    /// Aggregate call nodes, in pre-order
    pub aggregates: Vec<&'a Expression>,
    /// Call names missing from the registry. Their arguments were not scanned.
    pub unknown_functions: Vec<String>,
}

impl<'a> AggregateScan<'a> {
    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// The aggregates, or an error for the first unknown function.
    pub fn into_result(self) -> ExpressionResult<Vec<&'a Expression>> {
        match self.unknown_functions.into_iter().next() {
            Some(name) => Err(ExpressionError::UnknownFunction { name }),
            None => Ok(self.aggregates),
        }
    }
}

/// Collects the aggregate calls in `expr`, using the builtin functions.
pub fn mentioned_aggregate_funcs(expr: &Expression) -> AggregateScan<'_> {
    mentioned_aggregate_funcs_with(expr, FunctionRegistry::builtin())
}

pub fn mentioned_aggregate_funcs_with<'a>(
    expr: &'a Expression,
    functions: &FunctionRegistry,
) -> AggregateScan<'a> {
    let mut scan = AggregateScan {
        aggregates: Vec::new(),
        unknown_functions: Vec::new(),
    };
    collect(expr, functions, &mut scan);
    scan
}

/// True iff `expr` mentions at least one aggregate call.
pub fn contains_aggregate_func(expr: &Expression) -> bool {
    !mentioned_aggregate_funcs(expr).is_empty()
}

fn collect<'a>(expr: &'a Expression, functions: &FunctionRegistry, scan: &mut AggregateScan<'a>) {
    match expr {
        Expression::Call { name, args, .. } => match functions.lookup(name) {
            Some(function) if function.is_aggregate => scan.aggregates.push(expr),
            Some(_) => {
                for arg in args {
                    collect(arg, functions, scan);
                }
            }
            None => {
                log::error!("unknown function {} in aggregate scan", name);
                scan.unknown_functions.push(name.clone());
            }
        },

        // Subqueries are planned on their own.
        Expression::SubQuery(_) | Expression::ExistsSubQuery { .. } => {}

        Expression::Value(_)
        | Expression::Ident(_)
        | Expression::Default { .. }
        | Expression::Variable { .. }
        | Expression::Position { .. }
        | Expression::Values { .. } => {}

        Expression::BinaryOperation { .. }
        | Expression::UnaryOperation { .. }
        | Expression::PExpr(_)
        | Expression::PatternIn { .. }
        | Expression::PatternLike { .. }
        | Expression::IsNull { .. }
        | Expression::IsTruth { .. }
        | Expression::Between { .. }
        | Expression::Row { .. }
        | Expression::ParamMarker { .. }
        | Expression::FunctionCast { .. }
        | Expression::FunctionConvert { .. }
        | Expression::FunctionSubstring { .. }
        | Expression::FunctionCase { .. }
        | Expression::WhenClause(_)
        | Expression::CompareSubQuery { .. } => {
            for child in expr.children() {
                collect(child, functions, scan);
            }
        }
    }
}
