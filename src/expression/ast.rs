//! Immutable syntax trees for context expressions.

use crate::context::ContextValue;

/// Comparison operators usable between two atoms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

/// A parsed context expression.
///
/// Trees are immutable and side-effect-free: evaluation never fails, it only
/// produces values (type mismatches resolve to `false` rather than erroring).
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A literal: `true`, `42`, `'dark'`.
    Constant(ContextValue),
    /// A context key lookup: `panel.focused`.
    ContextRef(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    /// Membership test: `mode in supportedModes`.
    In(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn constant(value: impl Into<ContextValue>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn context_ref(key: impl Into<String>) -> Self {
        Expr::ContextRef(key.into())
    }

    /// All context keys referenced anywhere in this tree, in source order.
    /// Useful for hosts that re-evaluate only when a referenced key changes.
    pub fn referenced_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys<'a>(&'a self, keys: &mut Vec<&'a str>) {
        match self {
            Expr::Constant(_) => {}
            Expr::ContextRef(key) => {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
            Expr::Not(inner) => inner.collect_keys(keys),
            Expr::And(a, b) | Expr::Or(a, b) | Expr::In(a, b) => {
                a.collect_keys(keys);
                b.collect_keys(keys);
            }
            Expr::Compare(_, a, b) => {
                a.collect_keys(keys);
                b.collect_keys(keys);
            }
        }
    }
}
