//! Recursive-descent parser for the when-clause grammar.
//!
//! Precedence, low to high: `||` < `&&` < `!` < comparison/`in` < atom.
//! Parsing is deterministic and total over the grammar: any input yields
//! exactly one tree or one located [`ParseError`].

use crate::context::ContextValue;

use super::ast::{CompareOp, Expr};
use super::lexer::{tokenize, Token, TokenKind, Tokens};
use super::ParseError;

/// Parse `text` into an expression tree.
///
/// Fails with [`ParseError::Empty`] when the input is blank after trimming.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end_offset: text.chars().count(),
    };
    let expr = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(ParseError::TrailingInput { offset: token.offset });
    }
    Ok(expr)
}

struct Parser {
    tokens: Tokens,
    pos: usize,
    /// Offset reported when the input ends where more was expected.
    end_offset: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, token: Option<&Token>) -> ParseError {
        match token {
            Some(t) => ParseError::UnexpectedToken {
                offset: t.offset,
                found: t.kind.describe(),
            },
            None => ParseError::UnexpectedToken {
                offset: self.end_offset,
                found: "end of input".to_string(),
            },
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::OrOr)) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::AndAnd)) {
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Bang)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_atom()?;
        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::EqEq) => Some(CompareOp::Eq),
            Some(TokenKind::NotEq) => Some(CompareOp::Ne),
            Some(TokenKind::Gt) => Some(CompareOp::Gt),
            Some(TokenKind::Ge) => Some(CompareOp::Ge),
            Some(TokenKind::Lt) => Some(CompareOp::Lt),
            Some(TokenKind::Le) => Some(CompareOp::Le),
            Some(TokenKind::In) => {
                self.advance();
                let right = self.parse_atom()?;
                return Ok(Expr::In(Box::new(left), Box::new(right)));
            }
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let right = self.parse_atom()?;
                Ok(Expr::Compare(op, Box::new(left), Box::new(right)))
            }
            None => Ok(left),
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance();
        match token {
            Some(Token { kind: TokenKind::Ident(name), .. }) => Ok(Expr::ContextRef(name)),
            Some(Token { kind: TokenKind::Number(n), .. }) => {
                Ok(Expr::Constant(ContextValue::Number(n)))
            }
            Some(Token { kind: TokenKind::Str(s), .. }) => {
                Ok(Expr::Constant(ContextValue::Str(s)))
            }
            Some(Token { kind: TokenKind::True, .. }) => {
                Ok(Expr::Constant(ContextValue::Bool(true)))
            }
            Some(Token { kind: TokenKind::False, .. }) => {
                Ok(Expr::Constant(ContextValue::Bool(false)))
            }
            Some(Token { kind: TokenKind::LParen, .. }) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some(Token { kind: TokenKind::RParen, .. }) => Ok(inner),
                    Some(token) => Err(ParseError::UnbalancedParens { offset: token.offset }),
                    None => Err(ParseError::UnbalancedParens { offset: self.end_offset }),
                }
            }
            Some(Token { kind: TokenKind::RParen, offset }) => {
                Err(ParseError::UnbalancedParens { offset })
            }
            other => Err(self.unexpected(other.as_ref())),
        }
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
