//! Function descriptors and the builtin function registry.
//!
//! The evaluator and the aggregate classifier resolve `Call` nodes here by
//! lowercased name. Aggregates are described but carry no scalar body; they
//! are computed by the executor over groups of rows.

use crate::context::Context;
use crate::expression::time_value::system_timestamp;
use crate::expression::{ExpressionError, ExpressionResult};
use crate::types::{
    compare_values, time::check_fsp, to_f64, to_text, Time, TimeError, TimeType, Value,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Scalar function implementation over already evaluated arguments.
pub type FunctionBody = fn(&[Value], Option<&dyn Context>) -> ExpressionResult<Value>;

/// Describes a callable function.
#[derive(Clone)]
pub struct Function {
    pub name: String,
    pub min_args: usize,
    /// `None` means variadic.
    pub max_args: Option<usize>,
    pub is_aggregate: bool,
    /// Result depends only on the arguments, so calls with constant
    /// arguments can be folded.
    pub is_static: bool,
    pub body: Option<FunctionBody>,
}

impl Function {
    pub fn scalar(name: &str, min_args: usize, max_args: Option<usize>, body: FunctionBody) -> Self {
        Self {
            name: name.to_lowercase(),
            min_args,
            max_args,
            is_aggregate: false,
            is_static: true,
            body: Some(body),
        }
    }

    pub fn aggregate(name: &str, min_args: usize, max_args: Option<usize>) -> Self {
        Self {
            name: name.to_lowercase(),
            min_args,
            max_args,
            is_aggregate: true,
            is_static: false,
            body: None,
        }
    }

    /// Marks the function as depending on session state.
    pub fn non_static(mut self) -> Self {
        self.is_static = false;
        self
    }

    pub fn check_arity(&self, actual: usize) -> ExpressionResult<()> {
        let in_range = actual >= self.min_args && self.max_args.map_or(true, |max| actual <= max);
        if in_range {
            return Ok(());
        }
        let expected = match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        };
        Err(ExpressionError::FunctionArgumentCount {
            function: self.name.clone(),
            expected,
            actual,
        })
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("is_aggregate", &self.is_aggregate)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// Name-indexed set of functions
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry of builtin functions.
    pub fn builtin() -> &'static FunctionRegistry {
        static BUILTIN: OnceLock<FunctionRegistry> = OnceLock::new();
        BUILTIN.get_or_init(Self::with_builtins)
    }

    /// A fresh registry holding the builtin functions, for callers that
    /// want to register their own on top.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        for name in ["count", "sum", "avg", "min", "max"] {
            registry.register(Function::aggregate(name, 1, Some(1)));
        }
        registry.register(Function::aggregate("group_concat", 1, None));

        registry.register(Function::scalar("abs", 1, Some(1), builtin_abs));
        registry.register(Function::scalar("coalesce", 1, None, builtin_coalesce));
        registry.register(Function::scalar("ifnull", 2, Some(2), builtin_ifnull));
        registry.register(Function::scalar("nullif", 2, Some(2), builtin_nullif));
        registry.register(Function::scalar("concat", 1, None, builtin_concat));
        registry.register(Function::scalar("lower", 1, Some(1), builtin_lower));
        registry.register(Function::scalar("upper", 1, Some(1), builtin_upper));
        registry.register(Function::scalar("length", 1, Some(1), builtin_length));
        registry.register(Function::scalar("now", 0, Some(1), builtin_now).non_static());
        registry.register(
            Function::scalar("current_timestamp", 0, Some(1), builtin_now).non_static(),
        );

        registry
    }

    pub fn register(&mut self, function: Function) {
        self.functions.insert(function.name.clone(), function);
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&Function> {
        self.functions.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

fn builtin_abs(args: &[Value], _ctx: Option<&dyn Context>) -> ExpressionResult<Value> {
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Int64(v) => v
            .checked_abs()
            .map(Value::Int64)
            .ok_or_else(|| ExpressionError::Overflow {
                expression: format!("abs({})", v),
            }),
        Value::Uint64(v) => Ok(Value::Uint64(*v)),
        other => Ok(Value::Float64(to_f64(other)?.abs())),
    }
}

fn builtin_coalesce(args: &[Value], _ctx: Option<&dyn Context>) -> ExpressionResult<Value> {
    Ok(args
        .iter()
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null))
}

fn builtin_ifnull(args: &[Value], ctx: Option<&dyn Context>) -> ExpressionResult<Value> {
    builtin_coalesce(args, ctx)
}

fn builtin_nullif(args: &[Value], _ctx: Option<&dyn Context>) -> ExpressionResult<Value> {
    let (left, right) = (&args[0], &args[1]);
    if left.is_null() || right.is_null() {
        return Ok(left.clone());
    }
    if compare_values(left, right)? == Ordering::Equal {
        Ok(Value::Null)
    } else {
        Ok(left.clone())
    }
}

fn builtin_concat(args: &[Value], _ctx: Option<&dyn Context>) -> ExpressionResult<Value> {
    let mut result = String::new();
    for arg in args {
        if arg.is_null() {
            return Ok(Value::Null);
        }
        result.push_str(&to_text(arg)?);
    }
    Ok(Value::String(result))
}

fn map_text(value: &Value, f: impl Fn(&str) -> Value) -> ExpressionResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    Ok(f(&to_text(value)?))
}

fn builtin_lower(args: &[Value], _ctx: Option<&dyn Context>) -> ExpressionResult<Value> {
    map_text(&args[0], |s| Value::String(s.to_lowercase()))
}

fn builtin_upper(args: &[Value], _ctx: Option<&dyn Context>) -> ExpressionResult<Value> {
    map_text(&args[0], |s| Value::String(s.to_uppercase()))
}

// Byte length, as MySQL's LENGTH.
fn builtin_length(args: &[Value], _ctx: Option<&dyn Context>) -> ExpressionResult<Value> {
    map_text(&args[0], |s| Value::Int64(s.len() as i64))
}

fn builtin_now(args: &[Value], ctx: Option<&dyn Context>) -> ExpressionResult<Value> {
    let fsp = match args.first() {
        Some(v) => {
            let n = crate::types::to_i64(v)?;
            i32::try_from(n).map_err(|_| {
                TimeError::InvalidFsp(if n < 0 { i32::MIN } else { i32::MAX })
            })?
        }
        None => 0,
    };
    let fsp = check_fsp(fsp)?;
    let now = system_timestamp(ctx)?;
    Ok(Value::Time(Time::new(now, TimeType::Datetime, fsp)?))
}
