//! Session context and evaluation environment.
//!
//! A [`Context`] is the session-scoped side of evaluation: system and user
//! variables, plus resolution of nested queries. An [`Environment`] is the
//! per-call binding set the caller hands to the evaluator, holding outer-row
//! values and the callbacks that resolve identifiers, `DEFAULT`, positional
//! references and `VALUES(col)`.

use crate::expression::{ExpressionError, ExpressionResult, SubQuery};
use crate::types::Value;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Environment key of the column name used by a bare `DEFAULT`.
pub const EXPR_EVAL_DEFAULT_NAME: &str = "$defaultName";

/// Environment key of the identifier resolver.
pub const EXPR_EVAL_IDENT_FUNC: &str = "$identFunc";

/// Environment key of the select-list position resolver.
pub const EXPR_EVAL_POSITION_FUNC: &str = "$positionFunc";

/// Environment key of the `VALUES(col)` resolver.
pub const EXPR_EVAL_VALUES_FUNC: &str = "$valuesFunc";

/// Session variable holding a fixed Unix timestamp for `CURRENT_TIMESTAMP`.
pub const TIMESTAMP_VAR: &str = "timestamp";

/// Session-scoped facilities consulted during evaluation.
pub trait Context {
    /// Value of a system variable, if set.
    fn session_variable(&self, name: &str) -> Option<String>;

    /// Value of a user variable (`@name`), if set.
    fn user_variable(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Number of columns the subquery yields.
    fn subquery_column_count(&self, query: &SubQuery) -> ExpressionResult<usize> {
        Err(ExpressionError::UnresolvedSubquery {
            query: query.text.clone(),
        })
    }

    /// Rows produced by the subquery. Multi-column rows are `Value::Row`.
    fn evaluate_subquery(&self, query: &SubQuery, _env: &Environment) -> ExpressionResult<Vec<Value>> {
        Err(ExpressionError::UnresolvedSubquery {
            query: query.text.clone(),
        })
    }
}

#[derive(Debug, Clone)]
struct ResolvedSubquery {
    column_count: usize,
    rows: Vec<Value>,
}

/// In-memory [`Context`] for a single session.
///
/// Variables can be changed through a shared reference, so one session can be
/// handed to several evaluators while `SET` statements update it.
#[derive(Debug, Default)]
pub struct SessionContext {
    system_vars: RwLock<HashMap<String, String>>,
    user_vars: RwLock<HashMap<String, Value>>,
    subqueries: RwLock<HashMap<String, ResolvedSubquery>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a system variable. Names are case-insensitive.
    pub fn set_system_var(&self, name: &str, value: impl Into<String>) {
        self.system_vars
            .write()
            .insert(name.to_lowercase(), value.into());
    }

    pub fn unset_system_var(&self, name: &str) {
        self.system_vars.write().remove(&name.to_lowercase());
    }

    /// Sets a user variable. Names are case-insensitive.
    pub fn set_user_var(&self, name: &str, value: Value) {
        self.user_vars.write().insert(name.to_lowercase(), value);
    }

    /// Registers the result of a subquery, keyed by its text.
    pub fn register_subquery(&self, text: impl Into<String>, column_count: usize, rows: Vec<Value>) {
        self.subqueries.write().insert(
            text.into(),
            ResolvedSubquery { column_count, rows },
        );
    }
}

impl Context for SessionContext {
    fn session_variable(&self, name: &str) -> Option<String> {
        self.system_vars.read().get(&name.to_lowercase()).cloned()
    }

    fn user_variable(&self, name: &str) -> Option<Value> {
        self.user_vars.read().get(&name.to_lowercase()).cloned()
    }

    fn subquery_column_count(&self, query: &SubQuery) -> ExpressionResult<usize> {
        self.subqueries
            .read()
            .get(&query.text)
            .map(|resolved| resolved.column_count)
            .ok_or_else(|| ExpressionError::UnresolvedSubquery {
                query: query.text.clone(),
            })
    }

    fn evaluate_subquery(&self, query: &SubQuery, _env: &Environment) -> ExpressionResult<Vec<Value>> {
        self.subqueries
            .read()
            .get(&query.text)
            .map(|resolved| resolved.rows.clone())
            .ok_or_else(|| ExpressionError::UnresolvedSubquery {
                query: query.text.clone(),
            })
    }
}

/// Resolves a name (identifier, `DEFAULT` column or `VALUES` column) to a value.
pub type IdentFn = Arc<dyn Fn(&str) -> ExpressionResult<Value> + Send + Sync>;

/// Resolves a 1-based select-list position to a value.
pub type PositionFn = Arc<dyn Fn(usize) -> ExpressionResult<Value> + Send + Sync>;

/// Something bound in an [`Environment`]
#[derive(Clone)]
pub enum Binding {
    Value(Value),
    Name(String),
    Ident(IdentFn),
    Position(PositionFn),
    Values(IdentFn),
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Binding::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Binding::Ident(_) => write!(f, "Ident(<fn>)"),
            Binding::Position(_) => write!(f, "Position(<fn>)"),
            Binding::Values(_) => write!(f, "Values(<fn>)"),
        }
    }
}

/// Caller-owned bindings for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, binding: Binding) {
        self.bindings.insert(key.into(), binding);
    }

    pub fn get(&self, key: &str) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Binds a plain value, e.g. an outer-row column for a correlated subquery.
    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, Binding::Value(value));
        self
    }

    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.insert(EXPR_EVAL_DEFAULT_NAME, Binding::Name(name.into()));
        self
    }

    pub fn with_ident_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> ExpressionResult<Value> + Send + Sync + 'static,
    {
        self.insert(EXPR_EVAL_IDENT_FUNC, Binding::Ident(Arc::new(f)));
        self
    }

    pub fn with_position_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> ExpressionResult<Value> + Send + Sync + 'static,
    {
        self.insert(EXPR_EVAL_POSITION_FUNC, Binding::Position(Arc::new(f)));
        self
    }

    pub fn with_values_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> ExpressionResult<Value> + Send + Sync + 'static,
    {
        self.insert(EXPR_EVAL_VALUES_FUNC, Binding::Values(Arc::new(f)));
        self
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        match self.bindings.get(key) {
            Some(Binding::Value(v)) => Some(v),
            _ => None,
        }
    }

    pub fn default_name(&self) -> Option<&str> {
        match self.bindings.get(EXPR_EVAL_DEFAULT_NAME) {
            Some(Binding::Name(name)) => Some(name),
            _ => None,
        }
    }

    pub fn ident_fn(&self) -> Option<&IdentFn> {
        match self.bindings.get(EXPR_EVAL_IDENT_FUNC) {
            Some(Binding::Ident(f)) => Some(f),
            _ => None,
        }
    }

    pub fn position_fn(&self) -> Option<&PositionFn> {
        match self.bindings.get(EXPR_EVAL_POSITION_FUNC) {
            Some(Binding::Position(f)) => Some(f),
            _ => None,
        }
    }

    pub fn values_fn(&self) -> Option<&IdentFn> {
        match self.bindings.get(EXPR_EVAL_VALUES_FUNC) {
            Some(Binding::Values(f)) => Some(f),
            _ => None,
        }
    }
}
