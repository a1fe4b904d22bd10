//! Expression evaluation implementation.
//!
//! Evaluation follows MySQL semantics: booleans are the integers 1 and 0,
//! NULL propagates through arithmetic and comparisons (three-valued logic),
//! and division by zero yields NULL rather than an error.

use crate::context::{
    Context, Environment, EXPR_EVAL_DEFAULT_NAME, EXPR_EVAL_POSITION_FUNC, EXPR_EVAL_VALUES_FUNC,
};
use crate::expression::arity::has_same_column_count;
use crate::expression::expr::{SubQuery, WhenClause};
use crate::expression::{
    BinaryOperator, Expression, ExpressionError, ExpressionResult, UnaryOperator,
};
use crate::function::FunctionRegistry;
use crate::types::{compare_values, convert, numeric_prefix, to_bool, to_i64, to_text, Value};
use std::cmp::Ordering;

/// Charsets accepted by `CONVERT(.. USING ..)`
const SUPPORTED_CHARSETS: [&str; 5] = ["utf8", "utf8mb4", "binary", "latin1", "ascii"];

/// Evaluator for expressions
pub struct ExpressionEvaluator<'a> {
    /// Session facilities; `None` when folding constants
    context: Option<&'a dyn Context>,
    /// Caller-supplied bindings
    env: &'a Environment,
    functions: &'a FunctionRegistry,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create a new evaluator using the builtin functions
    pub fn new(context: Option<&'a dyn Context>, env: &'a Environment) -> Self {
        Self {
            context,
            env,
            functions: FunctionRegistry::builtin(),
        }
    }

    /// Use a caller-supplied function registry
    pub fn with_functions(mut self, functions: &'a FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Value(value) => Ok(value.clone()),

            Expression::Ident(ident) => self.resolve_ident(&ident.name),

            Expression::BinaryOperation { op, left, right } => {
                self.evaluate_binary_op(*op, left, right)
            }

            Expression::UnaryOperation { op, operand } => {
                let value = self.evaluate(operand)?;
                evaluate_unary_op(*op, value)
            }

            Expression::Call { name, args, .. } => self.evaluate_call(name, args),

            Expression::PExpr(inner) => self.evaluate(inner),

            Expression::PatternIn {
                expr: target,
                list,
                not,
            } => self.evaluate_in(target, list, *not),

            Expression::PatternLike {
                expr: target,
                pattern,
                escape,
                not,
            } => {
                let value = self.evaluate(target)?;
                let pattern = self.evaluate(pattern)?;
                if value.is_null() || pattern.is_null() {
                    return Ok(Value::Null);
                }
                let matched = like_match(&to_text(&value)?, &to_text(&pattern)?, *escape);
                Ok(Value::from_bool(matched != *not))
            }

            Expression::IsNull { expr: target, not } => {
                let value = self.evaluate(target)?;
                Ok(Value::from_bool(value.is_null() != *not))
            }

            Expression::IsTruth {
                expr: target,
                truth,
                not,
            } => {
                let value = self.evaluate(target)?;
                let matched = !value.is_null() && to_bool(&value)? == *truth;
                Ok(Value::from_bool(matched != *not))
            }

            Expression::Between {
                expr: target,
                left,
                right,
                not,
            } => {
                let value = self.evaluate(target)?;
                let low = self.evaluate(left)?;
                let high = self.evaluate(right)?;
                let result = and3(
                    compare(BinaryOperator::Ge, &value, &low)?,
                    compare(BinaryOperator::Le, &value, &high)?,
                );
                Ok(from_tristate(result.map(|b| b != *not)))
            }

            Expression::Row { values } => {
                if values.len() < 2 {
                    return Err(ExpressionError::RowTooShort);
                }
                values
                    .iter()
                    .map(|v| self.evaluate(v))
                    .collect::<ExpressionResult<Vec<_>>>()
                    .map(Value::Row)
            }

            Expression::ParamMarker { expr } => match expr {
                Some(bound) => self.evaluate(bound),
                None => Err(ExpressionError::UnboundParameter),
            },

            Expression::FunctionCast { expr, target } => {
                let value = self.evaluate(expr)?;
                Ok(convert(&value, target)?)
            }

            Expression::FunctionConvert { expr, charset } => {
                if !SUPPORTED_CHARSETS
                    .iter()
                    .any(|supported| supported.eq_ignore_ascii_case(charset))
                {
                    return Err(ExpressionError::UnknownCharset {
                        charset: charset.clone(),
                    });
                }
                let value = self.evaluate(expr)?;
                if value.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::String(to_text(&value)?))
            }

            Expression::FunctionSubstring { str_expr, pos, len } => {
                self.evaluate_substring(str_expr.as_deref(), pos.as_deref(), len.as_deref())
            }

            Expression::FunctionCase {
                value,
                when_clauses,
                else_clause,
            } => self.evaluate_case(value.as_deref(), when_clauses, else_clause.as_deref()),

            // Only reachable when a clause is evaluated on its own.
            Expression::WhenClause(clause) => self.evaluate(&clause.result),

            Expression::SubQuery(query) => {
                let mut rows = self.subquery_rows(query)?;
                match rows.len() {
                    0 => Ok(Value::Null),
                    1 => Ok(rows.remove(0)),
                    _ => Err(ExpressionError::SubqueryMultipleRows),
                }
            }

            Expression::ExistsSubQuery { query, not } => {
                let rows = self.subquery_rows(query)?;
                Ok(Value::from_bool(!rows.is_empty() != *not))
            }

            Expression::CompareSubQuery {
                op,
                left,
                query,
                all,
            } => self.evaluate_compare_subquery(*op, left, query, *all),

            Expression::Default { name } => {
                let name = match name {
                    Some(name) => name.as_str(),
                    None => self.env.default_name().ok_or(ExpressionError::MissingBinding {
                        key: EXPR_EVAL_DEFAULT_NAME,
                    })?,
                };
                self.resolve_ident(name)
            }

            Expression::Variable {
                name, is_system, ..
            } => self.evaluate_variable(name, *is_system),

            Expression::Position { n, .. } => {
                let resolve = self.env.position_fn().ok_or(ExpressionError::MissingBinding {
                    key: EXPR_EVAL_POSITION_FUNC,
                })?;
                resolve(*n)
            }

            Expression::Values { column } => {
                let resolve = self.env.values_fn().ok_or(ExpressionError::MissingBinding {
                    key: EXPR_EVAL_VALUES_FUNC,
                })?;
                resolve(column.as_str())
            }
        }
    }

    /// Plain value bindings win over the identifier resolver, so outer-row
    /// values of a correlated subquery shadow the inner row.
    fn resolve_ident(&self, name: &str) -> ExpressionResult<Value> {
        if let Some(value) = self.env.value(name) {
            return Ok(value.clone());
        }
        if let Some(resolve) = self.env.ident_fn() {
            return resolve(name);
        }
        Err(ExpressionError::UnknownColumn {
            name: name.to_string(),
        })
    }

    /// Evaluate a binary operation
    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> ExpressionResult<Value> {
        let lhs = self.evaluate(left)?;

        // AND/OR skip the right operand once the left one decides the result
        match op {
            BinaryOperator::AndAnd => {
                let l = tristate(&lhs)?;
                if l == Some(false) {
                    return Ok(Value::from_bool(false));
                }
                let r = tristate(&self.evaluate(right)?)?;
                return Ok(from_tristate(and3(l, r)));
            }
            BinaryOperator::OrOr => {
                let l = tristate(&lhs)?;
                if l == Some(true) {
                    return Ok(Value::from_bool(true));
                }
                let r = tristate(&self.evaluate(right)?)?;
                return Ok(from_tristate(or3(l, r)));
            }
            _ => {}
        }

        let rhs = self.evaluate(right)?;
        if op.is_comparison() {
            return compare(op, &lhs, &rhs).map(from_tristate);
        }
        if op == BinaryOperator::LogicXor {
            return match (tristate(&lhs)?, tristate(&rhs)?) {
                (Some(a), Some(b)) => Ok(Value::from_bool(a != b)),
                _ => Ok(Value::Null),
            };
        }
        arithmetic(op, &lhs, &rhs)
    }

    fn evaluate_call(&self, name: &str, args: &[Expression]) -> ExpressionResult<Value> {
        let function = self
            .functions
            .lookup(name)
            .ok_or_else(|| ExpressionError::UnknownFunction {
                name: name.to_string(),
            })?;
        if function.is_aggregate {
            return Err(ExpressionError::InvalidAggregateUse {
                name: function.name.clone(),
            });
        }
        function.check_arity(args.len())?;
        let body = function
            .body
            .ok_or_else(|| ExpressionError::EvaluationError {
                message: format!("function {} has no scalar implementation", function.name),
            })?;

        let values = args
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<ExpressionResult<Vec<_>>>()?;
        body(&values, self.context)
    }

    fn evaluate_in(
        &self,
        target: &Expression,
        list: &[Expression],
        not: bool,
    ) -> ExpressionResult<Value> {
        has_same_column_count(self.context, target, list)?;

        let value = self.evaluate(target)?;
        if value.is_null() {
            return Ok(Value::Null);
        }

        let mut saw_null = false;
        for item in list {
            let candidate = self.evaluate(item)?;
            match compare(BinaryOperator::Eq, &value, &candidate)? {
                Some(true) => return Ok(Value::from_bool(!not)),
                Some(false) => {}
                None => saw_null = true,
            }
        }

        if saw_null {
            Ok(Value::Null)
        } else {
            Ok(Value::from_bool(not))
        }
    }

    /// `SUBSTRING(str, pos[, len])` with 1-based positions; a negative
    /// position counts from the end.
    fn evaluate_substring(
        &self,
        str_expr: Option<&Expression>,
        pos: Option<&Expression>,
        len: Option<&Expression>,
    ) -> ExpressionResult<Value> {
        let (Some(str_expr), Some(pos)) = (str_expr, pos) else {
            let actual = [str_expr, pos, len].iter().filter(|e| e.is_some()).count();
            return Err(ExpressionError::FunctionArgumentCount {
                function: "substring".to_string(),
                expected: "2 to 3".to_string(),
                actual,
            });
        };

        let text = self.evaluate(str_expr)?;
        let pos = self.evaluate(pos)?;
        let len = match len {
            Some(len) => Some(self.evaluate(len)?),
            None => None,
        };
        if text.is_null() || pos.is_null() || len.as_ref().is_some_and(Value::is_null) {
            return Ok(Value::Null);
        }

        let chars: Vec<char> = to_text(&text)?.chars().collect();
        let count = chars.len() as i64;
        let pos = to_i64(&pos)?;
        let empty = Ok(Value::String(String::new()));

        let start = match pos.cmp(&0) {
            Ordering::Greater => pos - 1,
            Ordering::Less => count + pos,
            Ordering::Equal => return empty,
        };
        if start < 0 || start >= count {
            return empty;
        }
        let end = match len {
            Some(len) => {
                let len = to_i64(&len)?;
                if len <= 0 {
                    return empty;
                }
                start.saturating_add(len).min(count)
            }
            None => count,
        };
        Ok(Value::String(chars[start as usize..end as usize].iter().collect()))
    }

    fn evaluate_case(
        &self,
        value: Option<&Expression>,
        when_clauses: &[WhenClause],
        else_clause: Option<&Expression>,
    ) -> ExpressionResult<Value> {
        let subject = match value {
            Some(value) => Some(self.evaluate(value)?),
            None => None,
        };

        for clause in when_clauses {
            let condition = self.evaluate(&clause.expr)?;
            let matched = match &subject {
                Some(subject) => compare(BinaryOperator::Eq, subject, &condition)? == Some(true),
                None => to_bool(&condition)?,
            };
            if matched {
                return self.evaluate(&clause.result);
            }
        }

        match else_clause {
            Some(else_clause) => self.evaluate(else_clause),
            None => Ok(Value::Null),
        }
    }

    fn subquery_rows(&self, query: &SubQuery) -> ExpressionResult<Vec<Value>> {
        match self.context {
            Some(ctx) => ctx.evaluate_subquery(query, self.env),
            None => Err(ExpressionError::UnresolvedSubquery {
                query: query.text.clone(),
            }),
        }
    }

    /// `left op ALL (..)` is true when every row satisfies `op`, `ANY` when
    /// one does. Unknown comparisons make an otherwise undecided result NULL.
    fn evaluate_compare_subquery(
        &self,
        op: BinaryOperator,
        left: &Expression,
        query: &SubQuery,
        all: bool,
    ) -> ExpressionResult<Value> {
        let value = self.evaluate(left)?;
        let rows = self.subquery_rows(query)?;

        let mut saw_null = false;
        for row in &rows {
            match compare(op, &value, row)? {
                Some(matched) if matched != all => return Ok(Value::from_bool(matched)),
                Some(_) => {}
                None => saw_null = true,
            }
        }

        if saw_null {
            Ok(Value::Null)
        } else {
            Ok(Value::from_bool(all))
        }
    }

    fn evaluate_variable(&self, name: &str, is_system: bool) -> ExpressionResult<Value> {
        if is_system {
            return self
                .context
                .and_then(|ctx| ctx.session_variable(name))
                .map(Value::String)
                .ok_or_else(|| ExpressionError::UnknownVariable {
                    name: name.to_string(),
                });
        }
        // Unset user variables read as NULL
        Ok(self
            .context
            .and_then(|ctx| ctx.user_variable(name))
            .unwrap_or(Value::Null))
    }
}

/// Truthiness with NULL kept as unknown.
fn tristate(value: &Value) -> ExpressionResult<Option<bool>> {
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(to_bool(value)?))
}

fn from_tristate(value: Option<bool>) -> Value {
    value.map_or(Value::Null, Value::from_bool)
}

fn and3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

/// Applies comparison `op`. `None` is the SQL unknown.
fn compare(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionResult<Option<bool>> {
    match (left, right) {
        (Value::Row(a), Value::Row(b)) => {
            if a.len() != b.len() {
                return Err(ExpressionError::OperandColumns { expected: a.len() });
            }
            compare_rows(op, a, b)
        }
        (Value::Row(a), _) => Err(ExpressionError::OperandColumns { expected: a.len() }),
        (_, Value::Row(_)) => Err(ExpressionError::OperandColumns { expected: 1 }),
        _ if op == BinaryOperator::NullEq => Ok(Some(match (left.is_null(), right.is_null()) {
            (true, true) => true,
            (false, false) => compare_values(left, right)? == Ordering::Equal,
            _ => false,
        })),
        _ if left.is_null() || right.is_null() => Ok(None),
        _ => Ok(Some(op.matches_ordering(compare_values(left, right)?))),
    }
}

fn compare_rows(op: BinaryOperator, a: &[Value], b: &[Value]) -> ExpressionResult<Option<bool>> {
    match op {
        BinaryOperator::Eq | BinaryOperator::NullEq => {
            let mut result = Some(true);
            for (x, y) in a.iter().zip(b) {
                match compare(op, x, y)? {
                    Some(false) => return Ok(Some(false)),
                    Some(true) => {}
                    None => result = None,
                }
            }
            Ok(result)
        }
        BinaryOperator::Ne => {
            let mut result = Some(false);
            for (x, y) in a.iter().zip(b) {
                match compare(op, x, y)? {
                    Some(true) => return Ok(Some(true)),
                    Some(false) => {}
                    None => result = None,
                }
            }
            Ok(result)
        }
        _ => {
            // Lexicographic: the first unequal pair decides
            for (x, y) in a.iter().zip(b) {
                if x.is_null() || y.is_null() {
                    return Ok(None);
                }
                let ordering = compare_values(x, y)?;
                if ordering != Ordering::Equal {
                    return Ok(Some(op.matches_ordering(ordering)));
                }
            }
            Ok(Some(op.matches_ordering(Ordering::Equal)))
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl Numeric {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Int64(v) => Some(Numeric::Int(*v)),
            Value::Uint64(v) => Some(Numeric::Uint(*v)),
            Value::Float64(v) => Some(Numeric::Float(*v)),
            Value::String(s) => Some(Numeric::Float(numeric_prefix(s))),
            Value::Time(t) => Some(Numeric::Int(t.to_packed_i64())),
            Value::Null | Value::Row(_) => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(v) => v as f64,
            Numeric::Uint(v) => v as f64,
            Numeric::Float(v) => v,
        }
    }

    fn as_i128(self) -> i128 {
        match self {
            Numeric::Int(v) => v as i128,
            Numeric::Uint(v) => v as i128,
            Numeric::Float(v) => v as i128,
        }
    }
}

fn not_arithmetic(op: BinaryOperator) -> ExpressionError {
    ExpressionError::EvaluationError {
        message: format!("{} is not an arithmetic operator", op),
    }
}

/// Evaluate an arithmetic operation
fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let (Some(a), Some(b)) = (Numeric::of(left), Numeric::of(right)) else {
        return Err(ExpressionError::InvalidOperandTypes {
            operator: op.as_str().to_string(),
            left_type: left.data_type(),
            right_type: right.data_type(),
        });
    };
    let overflow = || ExpressionError::Overflow {
        expression: format!("({} {} {})", left, op, right),
    };

    match (a, b) {
        _ if op == BinaryOperator::Div => float_arithmetic(op, a.as_f64(), b.as_f64(), overflow),
        (Numeric::Float(_), _) | (_, Numeric::Float(_)) => {
            float_arithmetic(op, a.as_f64(), b.as_f64(), overflow)
        }
        _ => integer_arithmetic(op, a, b, overflow),
    }
}

fn float_arithmetic(
    op: BinaryOperator,
    a: f64,
    b: f64,
    overflow: impl Fn() -> ExpressionError,
) -> ExpressionResult<Value> {
    let result = match op {
        BinaryOperator::Plus => a + b,
        BinaryOperator::Minus => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div | BinaryOperator::Mod if b == 0.0 => return Ok(Value::Null),
        BinaryOperator::Div => a / b,
        BinaryOperator::Mod => a % b,
        BinaryOperator::IntDiv => {
            if b == 0.0 {
                return Ok(Value::Null);
            }
            let quotient = (a / b).trunc();
            if !(i64::MIN as f64..=i64::MAX as f64).contains(&quotient) {
                return Err(overflow());
            }
            return Ok(Value::Int64(quotient as i64));
        }
        _ => return Err(not_arithmetic(op)),
    };
    if !result.is_finite() {
        return Err(overflow());
    }
    Ok(Value::Float64(result))
}

/// Integer arithmetic. The result is unsigned if either operand is.
fn integer_arithmetic(
    op: BinaryOperator,
    a: Numeric,
    b: Numeric,
    overflow: impl Fn() -> ExpressionError,
) -> ExpressionResult<Value> {
    let unsigned = matches!(a, Numeric::Uint(_)) || matches!(b, Numeric::Uint(_));
    let (x, y) = (a.as_i128(), b.as_i128());

    let result = match op {
        BinaryOperator::Plus => x + y,
        BinaryOperator::Minus => x - y,
        BinaryOperator::Mul => x.checked_mul(y).ok_or_else(&overflow)?,
        BinaryOperator::IntDiv | BinaryOperator::Mod if y == 0 => return Ok(Value::Null),
        BinaryOperator::IntDiv => x / y,
        BinaryOperator::Mod => x % y,
        _ => return Err(not_arithmetic(op)),
    };

    if unsigned {
        u64::try_from(result)
            .map(Value::Uint64)
            .map_err(|_| overflow())
    } else {
        i64::try_from(result)
            .map(Value::Int64)
            .map_err(|_| overflow())
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(op: UnaryOperator, value: Value) -> ExpressionResult<Value> {
    match (op, value) {
        (_, Value::Null) => Ok(Value::Null),
        (_, Value::Row(_)) => Err(ExpressionError::OperandColumns { expected: 1 }),
        (UnaryOperator::Plus, value) => Ok(value),
        (UnaryOperator::Minus, Value::Int64(v)) => {
            v.checked_neg()
                .map(Value::Int64)
                .ok_or_else(|| ExpressionError::Overflow {
                    expression: format!("-({})", v),
                })
        }
        (UnaryOperator::Minus, Value::Uint64(v)) => i64::try_from(-(v as i128))
            .map(Value::Int64)
            .map_err(|_| ExpressionError::Overflow {
                expression: format!("-({})", v),
            }),
        (UnaryOperator::Minus, Value::Float64(v)) => Ok(Value::Float64(-v)),
        (UnaryOperator::Minus, Value::String(s)) => Ok(Value::Float64(-numeric_prefix(&s))),
        (UnaryOperator::Minus, Value::Time(t)) => Ok(Value::Int64(-t.to_packed_i64())),
        (UnaryOperator::Not, value) => Ok(Value::from_bool(!to_bool(&value)?)),
        (UnaryOperator::BitNeg, Value::Uint64(v)) => Ok(Value::Uint64(!v)),
        (UnaryOperator::BitNeg, value) => Ok(Value::Uint64(!(to_i64(&value)? as u64))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
    /// `%`
    AnySequence,
    /// `_`
    AnyChar,
    Char(char),
}

fn compile_like(pattern: &str, escape: char) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            c if c == escape => LikeToken::Char(chars.next().unwrap_or(escape)),
            '%' => LikeToken::AnySequence,
            '_' => LikeToken::AnyChar,
            c => LikeToken::Char(c),
        };
        tokens.push(token);
    }
    tokens
}

/// Case-sensitive `LIKE` matching with `%`, `_` and an escape character.
fn like_match(text: &str, pattern: &str, escape: char) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern = compile_like(pattern, escape);

    let (mut t, mut p) = (0, 0);
    // Position of the last `%` and the text index it is currently matched up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        let advanced = match pattern.get(p) {
            Some(LikeToken::AnySequence) => {
                backtrack = Some((p, t));
                p += 1;
                true
            }
            Some(LikeToken::AnyChar) => {
                t += 1;
                p += 1;
                true
            }
            Some(LikeToken::Char(c)) if *c == text[t] => {
                t += 1;
                p += 1;
                true
            }
            _ => false,
        };
        if advanced {
            continue;
        }
        match backtrack {
            Some((star, matched)) => {
                p = star + 1;
                t = matched + 1;
                backtrack = Some((star, matched + 1));
            }
            None => return false,
        }
    }

    pattern[p..]
        .iter()
        .all(|token| *token == LikeToken::AnySequence)
}

/// Helper function to evaluate an expression with the builtin functions
pub fn evaluate_expression(
    expr: &Expression,
    context: Option<&dyn Context>,
    env: &Environment,
) -> ExpressionResult<Value> {
    ExpressionEvaluator::new(context, env).evaluate(expr)
}

/// Evaluates an expression the caller has already validated.
///
/// # Panics
///
/// Panics if evaluation fails. Only call this where the expression is known
/// to be evaluable, such as a literal column default checked at DDL time;
/// everything else goes through [`evaluate_expression`].
pub fn must_evaluate(expr: &Expression, context: Option<&dyn Context>, env: &Environment) -> Value {
    match evaluate_expression(expr, context, env) {
        Ok(value) => value,
        Err(err) => panic!("evaluating {} failed: {}", expr, err),
    }
}

/// Evaluates `expr` as a condition; NULL counts as false.
pub fn eval_bool_expr(
    context: Option<&dyn Context>,
    expr: &Expression,
    env: &Environment,
) -> ExpressionResult<bool> {
    let value = evaluate_expression(expr, context, env)?;
    if value.is_null() {
        return Ok(false);
    }
    Ok(to_bool(&value)?)
}
