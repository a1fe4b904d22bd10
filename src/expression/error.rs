//! Error types for expression evaluation.

use crate::types::{ConvertError, DataType, TimeError};
use thiserror::Error;

/// Errors that can occur while evaluating or validating expressions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Invalid operand types for operator
    #[error("Invalid operand types for operator {operator}: left={left_type:?}, right={right_type:?}")]
    InvalidOperandTypes {
        operator: String,
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    /// Identifier could not be resolved by the environment
    #[error("Unknown column '{name}'")]
    UnknownColumn { name: String },

    /// Invalid function name
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    /// Wrong number of function arguments
    #[error("Function {function} expects {expected} arguments, got {actual}")]
    FunctionArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Aggregate function evaluated outside of an aggregation
    #[error("Invalid use of aggregate function {name}")]
    InvalidAggregateUse { name: String },

    /// Operand arity does not match what the operator requires
    #[error("Operand should contain {expected} column(s)")]
    OperandColumns { expected: usize },

    /// Row constructor with fewer than two elements
    #[error("Operand should contain >= 2 columns for Row")]
    RowTooShort,

    #[error("Subquery '{query}' could not be resolved")]
    UnresolvedSubquery { query: String },

    #[error("Subquery returns more than 1 row")]
    SubqueryMultipleRows,

    #[error("Parameter marker is not bound to a value")]
    UnboundParameter,

    /// A callback the expression needs is missing from the environment
    #[error("No binding for '{key}' in evaluation environment")]
    MissingBinding { key: &'static str },

    #[error("Unknown system variable '{name}'")]
    UnknownVariable { name: String },

    #[error("Unknown character set: '{charset}'")]
    UnknownCharset { charset: String },

    #[error("Invalid default value")]
    InvalidDefaultValue,

    /// Session `timestamp` override is not an integer
    #[error("Invalid session timestamp '{value}': {reason}")]
    InvalidTimestampOverride { value: String, reason: String },

    #[error("BIGINT value is out of range in '{expression}'")]
    Overflow { expression: String },

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Time(#[from] TimeError),

    /// Generic evaluation error
    #[error("Expression evaluation error: {message}")]
    EvaluationError { message: String },
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
