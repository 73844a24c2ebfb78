//! The when-clause mini-language: grammar, parser, and evaluator.
//!
//! When-clauses gate visibility and enablement of commands, menu items, and
//! keybindings against current application state:
//!
//! ```text
//! editorFocus && !inputFocus
//! panel.kind == 'terminal' || panel.kind == 'output'
//! selectionCount >= 2
//! mode in supportedModes
//! ```
//!
//! The grammar is the crate's one bit-exact external contract: saved keymaps
//! carry these strings, so they must keep parsing identically.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{CompareOp, Expr};
pub use parser::parse;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::context::ContextView;

/// Structural errors from tokenizing or parsing an expression. Semantic type
/// mismatches are not errors; they evaluate to `false` (see [`eval`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected token '{found}' at offset {offset}")]
    UnexpectedToken { offset: usize, found: String },
    #[error("unterminated string literal at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("unbalanced parentheses at offset {offset}")]
    UnbalancedParens { offset: usize },
    #[error("unexpected trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

/// A parsed when-clause, paired with its source text.
///
/// Equality is structural (two clauses differing only in whitespace are
/// equal). Serializes as the source string, so rule records round-trip
/// through JSON unchanged.
#[derive(Clone, Debug)]
pub struct WhenClause {
    source: String,
    expr: Expr,
}

impl WhenClause {
    pub fn parse(text: impl Into<String>) -> Result<Self, ParseError> {
        let source = text.into();
        let expr = parse(&source)?;
        Ok(Self { source, expr })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn eval(&self, ctx: &dyn ContextView) -> bool {
        self.expr.eval_bool(ctx)
    }
}

impl PartialEq for WhenClause {
    fn eq(&self, other: &Self) -> bool {
        self.expr == other.expr
    }
}

impl fmt::Display for WhenClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for WhenClause {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for WhenClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for WhenClause {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        WhenClause::parse(text).map_err(serde::de::Error::custom)
    }
}
