//! Small tree utilities shared by the planner-facing passes.

use crate::expression::expr::{Expression, Visitor};

/// Strips any number of enclosing parentheses.
pub fn unwrap_parentheses(expr: &Expression) -> &Expression {
    let mut expr = expr;
    while let Expression::PExpr(inner) = expr {
        expr = inner.as_ref();
    }
    expr
}

/// True if `name` is qualified, as in `t.c1`.
pub fn is_qualified(name: &str) -> bool {
    name.contains('.')
}

struct ColumnCollector {
    names: Vec<String>,
}

impl Visitor for ColumnCollector {
    fn enter(&mut self, expr: &Expression) -> bool {
        if let Expression::Ident(ident) = expr {
            if !self
                .names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&ident.name))
            {
                self.names.push(ident.name.clone());
            }
        }
        true
    }
}

/// Distinct identifiers referenced by `expr`, in first-seen order.
pub fn mentioned_columns(expr: &Expression) -> Vec<String> {
    let mut collector = ColumnCollector { names: Vec::new() };
    expr.accept(&mut collector);
    collector.names
}
