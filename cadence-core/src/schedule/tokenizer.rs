//! Schedule expression tokenizer
//!
//! Lexes a schedule string into positioned tokens in a single linear pass.
//! Whitespace, block comments (`/* ... */`) and line comments (`// ...`) are
//! skippable separators.

use crate::{Error, Result};
use std::fmt;

/// A lexical token of the schedule language
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `[A-Za-z][A-Za-z0-9_]*`; consumers compare case-insensitively
    Identifier(String),
    /// Decimal literal: `\d+(\.\d+)?` or `.\d+`
    Number(String),
    OpenParen,
    CloseParen,
    Divide,
}

impl Token {
    /// Source image of the token
    pub fn image(&self) -> &str {
        match self {
            Token::Identifier(text) | Token::Number(text) => text,
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::Divide => "/",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.image())
    }
}

/// A token together with its byte offset in the source string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosToken {
    pub position: usize,
    pub token: Token,
}

impl PosToken {
    fn new(position: usize, token: Token) -> Self {
        Self { position, token }
    }
}

fn err_at(position: usize, message: impl Into<String>) -> Error {
    Error::Tokenizer { position, message: message.into() }
}

/// Tokenize a schedule expression
///
/// Total and linear in the input length; fails on the first unrecognized
/// character or unterminated block comment.
pub fn tokenize(text: &str) -> Result<Vec<PosToken>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b' ' | b'\t' | b'\r' | b'\n' => i += 1,
            b'(' => {
                tokens.push(PosToken::new(i, Token::OpenParen));
                i += 1;
            }
            b')' => {
                tokens.push(PosToken::new(i, Token::CloseParen));
                i += 1;
            }
            b'/' => match bytes.get(i + 1) {
                Some(b'*') => {
                    let close = text[i + 2..].find("*/").ok_or_else(|| {
                        err_at(i, "unterminated block comment")
                    })?;
                    i += 2 + close + 2;
                }
                Some(b'/') => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                }
                _ => {
                    tokens.push(PosToken::new(i, Token::Divide));
                    i += 1;
                }
            },
            b'A'..=b'Z' | b'a'..=b'z' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(PosToken::new(start, Token::Identifier(text[start..i].to_string())));
            }
            b'0'..=b'9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i < bytes.len()
                    && bytes[i] == b'.'
                    && bytes.get(i + 1).is_some_and(|d| d.is_ascii_digit())
                {
                    i += 1;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                tokens.push(PosToken::new(start, Token::Number(text[start..i].to_string())));
            }
            b'.' if bytes.get(i + 1).is_some_and(|d| d.is_ascii_digit()) => {
                let start = i;
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                tokens.push(PosToken::new(start, Token::Number(text[start..i].to_string())));
            }
            _ => {
                // Safe because every earlier advance stayed on an ASCII boundary
                let offending = text[i..].chars().next().unwrap_or('?');
                return Err(err_at(i, format!("unexpected character {offending:?}")));
            }
        }
    }

    Ok(tokens)
}
