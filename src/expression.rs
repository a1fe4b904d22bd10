//! Expression evaluation framework for query planning and execution.
//!
//! This module provides:
//! - Expression AST representation and traversal
//! - Evaluation against a session context and an environment
//! - Constant folding of static expressions
//! - Aggregate call detection for GROUP BY planning
//! - Column arity checks for row comparisons and IN lists
//! - Normalization of time-valued column defaults

pub mod aggregate;
pub mod arity;
pub mod error;
pub mod eval;
pub mod expr;
pub mod fold;
pub mod helper;
pub mod operator;
pub mod time_value;

pub use aggregate::{
    contains_aggregate_func, mentioned_aggregate_funcs, mentioned_aggregate_funcs_with,
    AggregateScan,
};
pub use arity::{check_all_one_columns, check_one_column, column_count, has_same_column_count};
pub use error::{ExpressionError, ExpressionResult};
pub use eval::{eval_bool_expr, evaluate_expression, must_evaluate, ExpressionEvaluator};
pub use expr::{Expression, Ident, SubQuery, Visitor, WhenClause};
pub use fold::{
    fast_eval, fold_constants, fold_constants_with, fold_static, fold_static_with, is_static,
    is_static_with,
};
pub use helper::{is_qualified, mentioned_columns, unwrap_parentheses};
pub use operator::{BinaryOperator, UnaryOperator};
pub use time_value::{
    current_time_expr, get_time_value, is_current_time_expr, system_timestamp, TimeSource,
    CURRENT_TIMESTAMP, ZERO_TIMESTAMP,
};
