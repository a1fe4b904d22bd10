//! SQL expression engine.
//!
//! Typed expression trees for scalar and row-valued SQL expressions, with
//! MySQL-flavoured evaluation, constant folding, aggregate detection, column
//! arity checks and normalization of time-valued defaults.

pub mod context;
pub mod expression;
pub mod function;
pub mod types;

pub use context::{Context, Environment, SessionContext};
pub use expression::{Expression, ExpressionError, ExpressionResult};
pub use function::{Function, FunctionRegistry};
pub use types::Value;
