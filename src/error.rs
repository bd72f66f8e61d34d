use thiserror::Error;

use crate::scan::token::{Token, TokenType};

pub const EXIT_SYNTAX: u8 = 65;
pub const EXIT_RUNTIME: u8 = 70;

/// Grammar violation; the first one found stops the parse.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub location: String,
    pub message: String,
}

impl ParseError {
    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        let location = match token.t_type {
            TokenType::Eof => " at end".to_string(),
            _ => format!(" at '{}'", token.lexeme),
        };
        ParseError {
            line: token.line,
            location,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}\n[line {line}]")]
pub struct RuntimeError {
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        RuntimeError {
            line,
            message: message.into(),
        }
    }

    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        RuntimeError::new(token.line, message)
    }
}

#[derive(Debug, Error)]
pub enum LoxError {
    /// One rendered `[line N] Error: ...` entry per bad token.
    #[error("{}", diagnostics.join("\n"))]
    Scan { diagnostics: Vec<String> },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl LoxError {
    pub fn exit_code(&self) -> u8 {
        match self {
            LoxError::Scan { .. } | LoxError::Parse(_) => EXIT_SYNTAX,
            LoxError::Runtime(_) => EXIT_RUNTIME,
        }
    }
}
