//! Tokenizer for the when-clause grammar.
//!
//! Offsets are character offsets into the input, carried through to parse
//! errors for diagnostics.

use smallvec::SmallVec;

use super::ParseError;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Context key: `[A-Za-z_][A-Za-z0-9_.]*`.
    Ident(String),
    Number(f64),
    Str(String),
    True,
    False,
    In,
    AndAnd,
    OrOr,
    Bang,
    EqEq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    LParen,
    RParen,
}

impl TokenKind {
    /// Source-ish rendering, used in "unexpected token" diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Str(s) => format!("'{}'", s),
            TokenKind::True => "true".to_string(),
            TokenKind::False => "false".to_string(),
            TokenKind::In => "in".to_string(),
            TokenKind::AndAnd => "&&".to_string(),
            TokenKind::OrOr => "||".to_string(),
            TokenKind::Bang => "!".to_string(),
            TokenKind::EqEq => "==".to_string(),
            TokenKind::NotEq => "!=".to_string(),
            TokenKind::Gt => ">".to_string(),
            TokenKind::Ge => ">=".to_string(),
            TokenKind::Lt => "<".to_string(),
            TokenKind::Le => "<=".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offset of the token's first character.
    pub offset: usize,
}

/// Most when-clauses are a handful of tokens; keep them on the stack.
pub type Tokens = SmallVec<[Token; 16]>;

pub fn tokenize(text: &str) -> Result<Tokens, ParseError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Tokens::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let offset = i;
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, offset });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, offset });
                i += 1;
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token { kind: TokenKind::NotEq, offset });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Bang, offset });
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token { kind: TokenKind::EqEq, offset });
                    i += 2;
                } else {
                    return Err(ParseError::UnexpectedToken {
                        offset,
                        found: "=".to_string(),
                    });
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token { kind: TokenKind::Ge, offset });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Gt, offset });
                    i += 1;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token { kind: TokenKind::Le, offset });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Lt, offset });
                    i += 1;
                }
            }
            '&' => {
                if chars.get(i + 1) == Some(&'&') {
                    tokens.push(Token { kind: TokenKind::AndAnd, offset });
                    i += 2;
                } else {
                    return Err(ParseError::UnexpectedToken {
                        offset,
                        found: "&".to_string(),
                    });
                }
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    tokens.push(Token { kind: TokenKind::OrOr, offset });
                    i += 2;
                } else {
                    return Err(ParseError::UnexpectedToken {
                        offset,
                        found: "|".to_string(),
                    });
                }
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end] != quote {
                    end += 1;
                }
                if end >= chars.len() {
                    return Err(ParseError::UnterminatedString { offset });
                }
                let literal: String = chars[start..end].iter().collect();
                tokens.push(Token { kind: TokenKind::Str(literal), offset });
                i = end + 1;
            }
            c if c.is_ascii_digit() => {
                let mut end = i;
                while end < chars.len() && chars[end].is_ascii_digit() {
                    end += 1;
                }
                if chars.get(end) == Some(&'.')
                    && chars.get(end + 1).is_some_and(|c| c.is_ascii_digit())
                {
                    end += 1;
                    while end < chars.len() && chars[end].is_ascii_digit() {
                        end += 1;
                    }
                }
                let literal: String = chars[i..end].iter().collect();
                let value: f64 = literal.parse().map_err(|_| ParseError::UnexpectedToken {
                    offset,
                    found: literal.clone(),
                })?;
                tokens.push(Token { kind: TokenKind::Number(value), offset });
                i = end;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = i;
                while end < chars.len()
                    && (chars[end].is_ascii_alphanumeric() || chars[end] == '_' || chars[end] == '.')
                {
                    end += 1;
                }
                let word: String = chars[i..end].iter().collect();
                let kind = match word.as_str() {
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    "in" => TokenKind::In,
                    _ => TokenKind::Ident(word),
                };
                tokens.push(Token { kind, offset });
                i = end;
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    offset,
                    found: other.to_string(),
                });
            }
        }
    }

    Ok(tokens)
}
