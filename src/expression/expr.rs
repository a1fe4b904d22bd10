//! Expression AST definitions.

use crate::expression::helper::is_qualified;
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::expression::{ExpressionError, ExpressionResult};
use crate::types::{FieldType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A column or name reference, possibly qualified as `table.column`.
/// Names compare case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn is_qualified(&self) -> bool {
        is_qualified(&self.name)
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// Handle to a nested query. Its arity and rows come from the
/// [`Context`](crate::context::Context) that resolves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuery {
    pub text: String,
}

impl SubQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// `WHEN expr THEN result` arm of a CASE expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenClause {
    pub expr: Box<Expression>,
    pub result: Box<Expression>,
}

impl WhenClause {
    pub fn new(expr: Expression, result: Expression) -> Self {
        Self {
            expr: Box::new(expr),
            result: Box::new(result),
        }
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Constant value
    Value(Value),

    /// Column or name reference
    Ident(Ident),

    BinaryOperation {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    UnaryOperation {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Function call, resolved by name against a function registry
    Call {
        name: String,
        args: Vec<Expression>,
        distinct: bool,
    },

    /// Parenthesized expression
    PExpr(Box<Expression>),

    /// `expr [NOT] IN (list)`
    PatternIn {
        expr: Box<Expression>,
        list: Vec<Expression>,
        not: bool,
    },

    /// `expr [NOT] LIKE pattern`
    PatternLike {
        expr: Box<Expression>,
        pattern: Box<Expression>,
        escape: char,
        not: bool,
    },

    /// `expr IS [NOT] NULL`
    IsNull { expr: Box<Expression>, not: bool },

    /// `expr IS [NOT] TRUE` / `expr IS [NOT] FALSE`
    IsTruth {
        expr: Box<Expression>,
        truth: bool,
        not: bool,
    },

    /// `expr [NOT] BETWEEN left AND right`
    Between {
        expr: Box<Expression>,
        left: Box<Expression>,
        right: Box<Expression>,
        not: bool,
    },

    /// Row constructor `(a, b, ...)`, at least two columns
    Row { values: Vec<Expression> },

    /// `?` placeholder, bound before execution
    ParamMarker { expr: Option<Box<Expression>> },

    /// `CAST(expr AS target)`
    FunctionCast {
        expr: Box<Expression>,
        target: FieldType,
    },

    /// `CONVERT(expr USING charset)`
    FunctionConvert {
        expr: Box<Expression>,
        charset: String,
    },

    /// `SUBSTRING(str, pos[, len])`
    FunctionSubstring {
        str_expr: Option<Box<Expression>>,
        pos: Option<Box<Expression>>,
        len: Option<Box<Expression>>,
    },

    /// `CASE [value] WHEN .. THEN .. [ELSE ..] END`
    FunctionCase {
        value: Option<Box<Expression>>,
        when_clauses: Vec<WhenClause>,
        else_clause: Option<Box<Expression>>,
    },

    WhenClause(WhenClause),

    /// Scalar subquery
    SubQuery(SubQuery),

    /// `[NOT] EXISTS (subquery)`
    ExistsSubQuery { query: SubQuery, not: bool },

    /// `left op ALL|ANY (subquery)`
    CompareSubQuery {
        op: BinaryOperator,
        left: Box<Expression>,
        query: SubQuery,
        all: bool,
    },

    /// `DEFAULT` or `DEFAULT(column)`
    Default { name: Option<String> },

    /// `@name`, `@@name` or `@@global.name`
    Variable {
        name: String,
        is_global: bool,
        is_system: bool,
    },

    /// 1-based select-list position, as in `ORDER BY 2`
    Position { n: usize, name: Option<String> },

    /// `VALUES(column)` in `ON DUPLICATE KEY UPDATE`
    Values { column: String },
}

impl Expression {
    /// Create a constant expression
    pub fn value(value: impl Into<Value>) -> Self {
        Expression::Value(value.into())
    }

    pub fn null() -> Self {
        Expression::Value(Value::Null)
    }

    /// Create an identifier expression
    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Ident(Ident::new(name))
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOperation {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOperation {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn plus(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Plus, left, right)
    }

    pub fn minus(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Minus, left, right)
    }

    pub fn mul(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Mul, left, right)
    }

    pub fn div(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Div, left, right)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::AndAnd, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::OrOr, left, right)
    }

    /// Negative constant as the parser produces it: `-(n)`.
    pub fn negative(value: impl Into<Value>) -> Self {
        Self::unary_op(UnaryOperator::Minus, Expression::value(value))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call {
            name: name.into(),
            args,
            distinct: false,
        }
    }

    pub fn call_distinct(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call {
            name: name.into(),
            args,
            distinct: true,
        }
    }

    /// Wrap in parentheses
    pub fn paren(expr: Expression) -> Self {
        Expression::PExpr(Box::new(expr))
    }

    /// Create a row constructor; rows need at least two columns.
    pub fn row(values: Vec<Expression>) -> ExpressionResult<Self> {
        if values.len() < 2 {
            return Err(ExpressionError::RowTooShort);
        }
        Ok(Expression::Row { values })
    }

    pub fn in_list(expr: Expression, list: Vec<Expression>, not: bool) -> Self {
        Expression::PatternIn {
            expr: Box::new(expr),
            list,
            not,
        }
    }

    pub fn like(expr: Expression, pattern: Expression, not: bool) -> Self {
        Expression::PatternLike {
            expr: Box::new(expr),
            pattern: Box::new(pattern),
            escape: '\\',
            not,
        }
    }

    pub fn is_null(expr: Expression, not: bool) -> Self {
        Expression::IsNull {
            expr: Box::new(expr),
            not,
        }
    }

    pub fn is_truth(expr: Expression, truth: bool, not: bool) -> Self {
        Expression::IsTruth {
            expr: Box::new(expr),
            truth,
            not,
        }
    }

    pub fn between(expr: Expression, left: Expression, right: Expression, not: bool) -> Self {
        Expression::Between {
            expr: Box::new(expr),
            left: Box::new(left),
            right: Box::new(right),
            not,
        }
    }

    pub fn param_marker(expr: Option<Expression>) -> Self {
        Expression::ParamMarker {
            expr: expr.map(Box::new),
        }
    }

    pub fn cast(expr: Expression, target: FieldType) -> Self {
        Expression::FunctionCast {
            expr: Box::new(expr),
            target,
        }
    }

    pub fn convert_using(expr: Expression, charset: impl Into<String>) -> Self {
        Expression::FunctionConvert {
            expr: Box::new(expr),
            charset: charset.into(),
        }
    }

    pub fn substring(str_expr: Expression, pos: Expression, len: Option<Expression>) -> Self {
        Expression::FunctionSubstring {
            str_expr: Some(Box::new(str_expr)),
            pos: Some(Box::new(pos)),
            len: len.map(Box::new),
        }
    }

    pub fn case(
        value: Option<Expression>,
        when_clauses: Vec<WhenClause>,
        else_clause: Option<Expression>,
    ) -> Self {
        Expression::FunctionCase {
            value: value.map(Box::new),
            when_clauses,
            else_clause: else_clause.map(Box::new),
        }
    }

    pub fn subquery(text: impl Into<String>) -> Self {
        Expression::SubQuery(SubQuery::new(text))
    }

    pub fn exists(text: impl Into<String>, not: bool) -> Self {
        Expression::ExistsSubQuery {
            query: SubQuery::new(text),
            not,
        }
    }

    pub fn compare_subquery(
        op: BinaryOperator,
        left: Expression,
        text: impl Into<String>,
        all: bool,
    ) -> Self {
        Expression::CompareSubQuery {
            op,
            left: Box::new(left),
            query: SubQuery::new(text),
            all,
        }
    }

    pub fn default_value(name: Option<&str>) -> Self {
        Expression::Default {
            name: name.map(str::to_string),
        }
    }

    pub fn variable(name: impl Into<String>, is_global: bool, is_system: bool) -> Self {
        Expression::Variable {
            name: name.into(),
            is_global,
            is_system,
        }
    }

    pub fn position(n: usize) -> Self {
        Expression::Position { n, name: None }
    }

    pub fn values(column: impl Into<String>) -> Self {
        Expression::Values {
            column: column.into(),
        }
    }

    /// Direct sub-expressions, in evaluation order.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Value(_)
            | Expression::Ident(_)
            | Expression::SubQuery(_)
            | Expression::ExistsSubQuery { .. }
            | Expression::Default { .. }
            | Expression::Variable { .. }
            | Expression::Position { .. }
            | Expression::Values { .. } => vec![],
            Expression::BinaryOperation { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expression::UnaryOperation { operand, .. } => vec![operand.as_ref()],
            Expression::Call { args, .. } => args.iter().collect(),
            Expression::PExpr(expr) => vec![expr.as_ref()],
            Expression::PatternIn { expr, list, .. } => {
                std::iter::once(expr.as_ref()).chain(list.iter()).collect()
            }
            Expression::PatternLike { expr, pattern, .. } => vec![expr.as_ref(), pattern.as_ref()],
            Expression::IsNull { expr, .. } | Expression::IsTruth { expr, .. } => {
                vec![expr.as_ref()]
            }
            Expression::Between {
                expr, left, right, ..
            } => vec![expr.as_ref(), left.as_ref(), right.as_ref()],
            Expression::Row { values } => values.iter().collect(),
            Expression::ParamMarker { expr } => expr.as_deref().into_iter().collect(),
            Expression::FunctionCast { expr, .. } | Expression::FunctionConvert { expr, .. } => {
                vec![expr.as_ref()]
            }
            Expression::FunctionSubstring { str_expr, pos, len } => [str_expr, pos, len]
                .into_iter()
                .filter_map(|e| e.as_deref())
                .collect(),
            Expression::FunctionCase {
                value,
                when_clauses,
                else_clause,
            } => {
                let mut children: Vec<&Expression> = value.as_deref().into_iter().collect();
                for clause in when_clauses {
                    children.push(clause.expr.as_ref());
                    children.push(clause.result.as_ref());
                }
                children.extend(else_clause.as_deref());
                children
            }
            Expression::WhenClause(clause) => vec![clause.expr.as_ref(), clause.result.as_ref()],
            Expression::CompareSubQuery { left, .. } => vec![left.as_ref()],
        }
    }

    /// Mutable access to direct sub-expressions, same order as [`children`](Self::children).
    pub fn children_mut(&mut self) -> Vec<&mut Expression> {
        match self {
            Expression::Value(_)
            | Expression::Ident(_)
            | Expression::SubQuery(_)
            | Expression::ExistsSubQuery { .. }
            | Expression::Default { .. }
            | Expression::Variable { .. }
            | Expression::Position { .. }
            | Expression::Values { .. } => vec![],
            Expression::BinaryOperation { left, right, .. } => vec![left.as_mut(), right.as_mut()],
            Expression::UnaryOperation { operand, .. } => vec![operand.as_mut()],
            Expression::Call { args, .. } => args.iter_mut().collect(),
            Expression::PExpr(expr) => vec![expr.as_mut()],
            Expression::PatternIn { expr, list, .. } => {
                std::iter::once(expr.as_mut()).chain(list.iter_mut()).collect()
            }
            Expression::PatternLike { expr, pattern, .. } => vec![expr.as_mut(), pattern.as_mut()],
            Expression::IsNull { expr, .. } | Expression::IsTruth { expr, .. } => {
                vec![expr.as_mut()]
            }
            Expression::Between {
                expr, left, right, ..
            } => vec![expr.as_mut(), left.as_mut(), right.as_mut()],
            Expression::Row { values } => values.iter_mut().collect(),
            Expression::ParamMarker { expr } => expr.as_deref_mut().into_iter().collect(),
            Expression::FunctionCast { expr, .. } | Expression::FunctionConvert { expr, .. } => {
                vec![expr.as_mut()]
            }
            Expression::FunctionSubstring { str_expr, pos, len } => [str_expr, pos, len]
                .into_iter()
                .filter_map(|e| e.as_deref_mut())
                .collect(),
            Expression::FunctionCase {
                value,
                when_clauses,
                else_clause,
            } => {
                let mut children: Vec<&mut Expression> = value.as_deref_mut().into_iter().collect();
                for clause in when_clauses {
                    children.push(clause.expr.as_mut());
                    children.push(clause.result.as_mut());
                }
                children.extend(else_clause.as_deref_mut());
                children
            }
            Expression::WhenClause(clause) => vec![clause.expr.as_mut(), clause.result.as_mut()],
            Expression::CompareSubQuery { left, .. } => vec![left.as_mut()],
        }
    }

    /// Pre-order walk over this node and all its descendants.
    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&Expression),
    {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Drive `visitor` over this tree.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        if visitor.enter(self) {
            for child in self.children() {
                child.accept(visitor);
            }
        }
        visitor.leave(self);
    }
}

/// Read-only tree visitor
pub trait Visitor {
    /// Called before the children of `expr`; returning `false` skips them.
    fn enter(&mut self, expr: &Expression) -> bool;

    /// Called after the children of `expr`.
    fn leave(&mut self, _expr: &Expression) {}
}

fn write_list(f: &mut fmt::Formatter<'_>, list: &[Expression]) -> fmt::Result {
    for (i, e) in list.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", e)?;
    }
    Ok(())
}

fn not_str(not: bool) -> &'static str {
    if not {
        "NOT "
    } else {
        ""
    }
}

impl fmt::Display for WhenClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WHEN {} THEN {}", self.expr, self.result)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Value(v) => write!(f, "{}", v),
            Expression::Ident(ident) => write!(f, "{}", ident.name),
            Expression::BinaryOperation { op, left, right } => {
                write!(f, "{} {} {}", left, op, right)
            }
            Expression::UnaryOperation { op, operand } => write!(f, "{}{}", op, operand),
            Expression::Call {
                name,
                args,
                distinct,
            } => {
                write!(f, "{}(", name)?;
                if *distinct {
                    write!(f, "DISTINCT ")?;
                }
                write_list(f, args)?;
                write!(f, ")")
            }
            Expression::PExpr(expr) => write!(f, "({})", expr),
            Expression::PatternIn { expr, list, not } => {
                write!(f, "{} {}IN (", expr, not_str(*not))?;
                write_list(f, list)?;
                write!(f, ")")
            }
            Expression::PatternLike {
                expr,
                pattern,
                escape,
                not,
            } => {
                write!(f, "{} {}LIKE {}", expr, not_str(*not), pattern)?;
                if *escape != '\\' {
                    write!(f, " ESCAPE '{}'", escape)?;
                }
                Ok(())
            }
            Expression::IsNull { expr, not } => write!(f, "{} IS {}NULL", expr, not_str(*not)),
            Expression::IsTruth { expr, truth, not } => write!(
                f,
                "{} IS {}{}",
                expr,
                not_str(*not),
                if *truth { "TRUE" } else { "FALSE" }
            ),
            Expression::Between {
                expr,
                left,
                right,
                not,
            } => write!(f, "{} {}BETWEEN {} AND {}", expr, not_str(*not), left, right),
            Expression::Row { values } => {
                write!(f, "(")?;
                write_list(f, values)?;
                write!(f, ")")
            }
            Expression::ParamMarker { .. } => write!(f, "?"),
            Expression::FunctionCast { expr, target } => write!(f, "CAST({} AS {})", expr, target),
            Expression::FunctionConvert { expr, charset } => {
                write!(f, "CONVERT({} USING {})", expr, charset)
            }
            Expression::FunctionSubstring { str_expr, pos, len } => {
                let args: Vec<Expression> = [str_expr, pos, len]
                    .into_iter()
                    .filter_map(|e| e.as_deref().cloned())
                    .collect();
                write!(f, "SUBSTRING(")?;
                write_list(f, &args)?;
                write!(f, ")")
            }
            Expression::FunctionCase {
                value,
                when_clauses,
                else_clause,
            } => {
                write!(f, "CASE")?;
                if let Some(value) = value {
                    write!(f, " {}", value)?;
                }
                for clause in when_clauses {
                    write!(f, " {}", clause)?;
                }
                if let Some(else_clause) = else_clause {
                    write!(f, " ELSE {}", else_clause)?;
                }
                write!(f, " END")
            }
            Expression::WhenClause(clause) => write!(f, "{}", clause),
            Expression::SubQuery(query) => write!(f, "({})", query.text),
            Expression::ExistsSubQuery { query, not } => {
                write!(f, "{}EXISTS ({})", not_str(*not), query.text)
            }
            Expression::CompareSubQuery {
                op,
                left,
                query,
                all,
            } => write!(
                f,
                "{} {} {} ({})",
                left,
                op,
                if *all { "ALL" } else { "ANY" },
                query.text
            ),
            Expression::Default { name: None } => write!(f, "DEFAULT"),
            Expression::Default { name: Some(name) } => write!(f, "DEFAULT({})", name),
            Expression::Variable {
                name,
                is_global,
                is_system,
            } => match (is_system, is_global) {
                (true, true) => write!(f, "@@global.{}", name),
                (true, false) => write!(f, "@@{}", name),
                (false, _) => write!(f, "@{}", name),
            },
            Expression::Position { n, .. } => write!(f, "{}", n),
            Expression::Values { column } => write!(f, "VALUES({})", column),
        }
    }
}
