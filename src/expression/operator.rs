//! Operator definitions for expressions.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic
    Plus,
    Minus,
    Mul,
    Div,
    IntDiv,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `<=>`, equality that treats NULL as an ordinary value
    NullEq,

    // Logical
    AndAnd,
    OrOr,
    LogicXor,
}

impl BinaryOperator {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Plus
                | BinaryOperator::Minus
                | BinaryOperator::Mul
                | BinaryOperator::Div
                | BinaryOperator::IntDiv
                | BinaryOperator::Mod
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
                | BinaryOperator::NullEq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            BinaryOperator::AndAnd | BinaryOperator::OrOr | BinaryOperator::LogicXor
        )
    }

    /// Whether an ordering between two non-NULL operands satisfies this
    /// comparison. Non-comparison operators never match.
    pub fn matches_ordering(&self, ordering: Ordering) -> bool {
        match self {
            BinaryOperator::Eq | BinaryOperator::NullEq => ordering == Ordering::Equal,
            BinaryOperator::Ne => ordering != Ordering::Equal,
            BinaryOperator::Lt => ordering == Ordering::Less,
            BinaryOperator::Le => ordering != Ordering::Greater,
            BinaryOperator::Gt => ordering == Ordering::Greater,
            BinaryOperator::Ge => ordering != Ordering::Less,
            _ => false,
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::IntDiv => "DIV",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::NullEq => "<=>",
            BinaryOperator::AndAnd => "AND",
            BinaryOperator::OrOr => "OR",
            BinaryOperator::LogicXor => "XOR",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
    BitNeg,
}

impl UnaryOperator {
    /// `+` and `-` are the only unary operators constant folding and
    /// numeric default values accept.
    pub fn is_sign(&self) -> bool {
        matches!(self, UnaryOperator::Plus | UnaryOperator::Minus)
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Not => "NOT ",
            UnaryOperator::BitNeg => "~",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
