//! Total, side-effect-free evaluation of expression trees.
//!
//! Type mismatches never fail: equality across kinds is `false`, ordering
//! across kinds is `false`, `in` with a non-string right operand is `false`.
//! This permissive policy is load-bearing for compatibility with saved
//! when-clauses; do not tighten it to strict typing.

use crate::context::{ContextValue, ContextView};

use super::ast::{CompareOp, Expr};

impl Expr {
    /// Evaluate against `ctx`, producing a value. Never fails; missing keys
    /// read as `Null`.
    pub fn eval(&self, ctx: &dyn ContextView) -> ContextValue {
        match self {
            Expr::Constant(value) => value.clone(),
            Expr::ContextRef(key) => ctx.value(key),
            Expr::Not(inner) => ContextValue::Bool(!inner.eval(ctx).is_truthy()),
            Expr::And(a, b) => {
                ContextValue::Bool(a.eval(ctx).is_truthy() && b.eval(ctx).is_truthy())
            }
            Expr::Or(a, b) => {
                ContextValue::Bool(a.eval(ctx).is_truthy() || b.eval(ctx).is_truthy())
            }
            Expr::Compare(op, a, b) => {
                ContextValue::Bool(compare(*op, &a.eval(ctx), &b.eval(ctx)))
            }
            Expr::In(a, b) => ContextValue::Bool(membership(&a.eval(ctx), &b.eval(ctx))),
        }
    }

    /// Truthiness of [`Expr::eval`] — the form used for when-clauses.
    pub fn eval_bool(&self, ctx: &dyn ContextView) -> bool {
        self.eval(ctx).is_truthy()
    }
}

fn compare(op: CompareOp, left: &ContextValue, right: &ContextValue) -> bool {
    match op {
        CompareOp::Eq => left == right,
        CompareOp::Ne => left != right,
        CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => {
            let Some(ordering) = order(left, right) else {
                return false;
            };
            match op {
                CompareOp::Gt => ordering.is_gt(),
                CompareOp::Ge => ordering.is_ge(),
                CompareOp::Lt => ordering.is_lt(),
                CompareOp::Le => ordering.is_le(),
                CompareOp::Eq | CompareOp::Ne => unreachable!(),
            }
        }
    }
}

/// Ordering is defined only between two numbers or two strings.
fn order(left: &ContextValue, right: &ContextValue) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (ContextValue::Number(a), ContextValue::Number(b)) => a.partial_cmp(b),
        (ContextValue::Str(a), ContextValue::Str(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// `a in b`: substring containment when both sides are strings. Context
/// values are scalars, so strings are the only set-like operand.
fn membership(left: &ContextValue, right: &ContextValue) -> bool {
    match (left, right) {
        (ContextValue::Str(needle), ContextValue::Str(haystack)) => haystack.contains(needle),
        _ => false,
    }
}
