use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frontend::lookahead::{Lookahead, LookaheadError};

#[derive(Error, PartialEq, Debug)]
pub enum LexerError {
    #[error("unexpected token: {0}")]
    UnexpectedChar(char),

    #[error(transparent)]
    Buffer(#[from] LookaheadError),
}

/// A scanned scalar, keeping the source text it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(String),
}

impl Value {
    pub fn raw(&self) -> &str {
        match self {
            Value::Number(raw) => raw,
        }
    }

    /// Numeric reading of the raw text. Only the longest numeric prefix is
    /// used, so `1.2.3` reads as `1.2` and a lone `.` as NaN.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Number(raw) => parse_float_prefix(raw),
        }
    }
}

fn parse_float_prefix(raw: &str) -> f64 {
    let mut parts = raw.splitn(3, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();

    if whole.is_empty() && fraction.is_empty() {
        return f64::NAN;
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let fraction = if fraction.is_empty() { "0" } else { fraction };

    format!("{whole}.{fraction}").parse().unwrap_or(f64::NAN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ops {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "*")]
    Mult,
    #[serde(rename = "/")]
    Div,
}

impl Ops {
    pub fn as_char(&self) -> char {
        match self {
            Ops::Plus => '+',
            Ops::Minus => '-',
            Ops::Mult => '*',
            Ops::Div => '/',
        }
    }

    pub fn is_additive(&self) -> bool {
        matches!(self, Ops::Plus | Ops::Minus)
    }
}

impl fmt::Display for Ops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(Value),
    // `+` and `-`
    ExprOperator(Ops),
    // `*` and `/`
    TermOperator(Ops),
    LeftParen,
    RightParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{}", value.raw()),
            Token::ExprOperator(op) | Token::TermOperator(op) => write!(f, "{op}"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
        }
    }
}

impl Token {
    fn single_char_token(c: char) -> Option<Token> {
        use Token::*;

        match c {
            '+' => Some(ExprOperator(Ops::Plus)),
            '-' => Some(ExprOperator(Ops::Minus)),
            '*' => Some(TermOperator(Ops::Mult)),
            '/' => Some(TermOperator(Ops::Div)),
            '(' => Some(LeftParen),
            ')' => Some(RightParen),
            _ => None,
        }
    }
}

// Unlike char::is_ascii_whitespace this includes the vertical tab.
fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0B' | '\x0C' | '\r' | '\n')
}

fn is_numeral_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn lex_number(chars: &mut Lookahead<char>) -> Result<Token, LexerError> {
    let mut raw = String::new();

    while chars.current().copied().is_some_and(is_numeral_char) {
        raw.push(chars.get(1)?);
    }

    Ok(Token::Number(Value::Number(raw)))
}

pub trait Lex {
    fn lex(&self) -> Result<Vec<Token>, LexerError>;
}

impl Lex for str {
    fn lex(&self) -> Result<Vec<Token>, LexerError> {
        tokenize(self)
    }
}

/// Scan the whole input eagerly into a token vector.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexerError> {
    let mut chars: Lookahead<char> = text.chars().collect();
    let mut tokens = Vec::new();

    loop {
        while chars.current().copied().is_some_and(is_whitespace) {
            chars.get(1)?;
        }

        let Some(&c) = chars.current() else {
            break;
        };

        let token = if is_numeral_char(c) {
            lex_number(&mut chars)?
        } else {
            let token = Token::single_char_token(c).ok_or(LexerError::UnexpectedChar(c))?;
            chars.get(1)?;
            token
        };

        trace!("lexed token {token:?}");
        tokens.push(token);
    }

    Ok(tokens)
}
