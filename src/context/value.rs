//! Scalar context values and the truthiness rules used by when-clauses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar value stored in the context, or produced by evaluating an
/// expression.
///
/// Context values are deliberately limited to JSON-like scalars. Missing keys
/// read as [`ContextValue::Null`], which is falsy, so when-clauses can name
/// keys that have never been set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl ContextValue {
    /// Truthiness as used by when-clause evaluation: `null`, `false`, `0`,
    /// and `""` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ContextValue::Null => false,
            ContextValue::Bool(b) => *b,
            ContextValue::Number(n) => *n != 0.0,
            ContextValue::Str(s) => !s.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ContextValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ContextValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ContextValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Null => write!(f, "null"),
            ContextValue::Bool(b) => write!(f, "{}", b),
            ContextValue::Number(n) => write!(f, "{}", n),
            ContextValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for ContextValue {
    fn from(b: bool) -> Self {
        ContextValue::Bool(b)
    }
}

impl From<f64> for ContextValue {
    fn from(n: f64) -> Self {
        ContextValue::Number(n)
    }
}

impl From<i64> for ContextValue {
    fn from(n: i64) -> Self {
        ContextValue::Number(n as f64)
    }
}

impl From<i32> for ContextValue {
    fn from(n: i32) -> Self {
        ContextValue::Number(n as f64)
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        ContextValue::Str(s.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        ContextValue::Str(s)
    }
}

impl<T: Into<ContextValue>> From<Option<T>> for ContextValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ContextValue::Null)
    }
}
