use std::fmt;
use std::result;

use crate::token::Token;

pub type Result<T> = result::Result<T, Error>;

/// What went wrong at runtime. Undefined reads and undefined assignments share a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Type,
    UndefinedVariable,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Type => write!(f, "TypeError"),
            Fault::UndefinedVariable => write!(f, "UndefinedVariable"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("[line {line}]: {message}")]
    Lexical { line: usize, message: String },

    #[error("[line {}]{}: {message}", .token.line, location(.token))]
    Syntactic { token: Token, message: String },

    #[error("[line {}]{}: {fault}: {message}", .token.line, location(.token))]
    Runtime { token: Token, fault: Fault, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn lexical<S: Into<String>>(line: usize, message: S) -> Error {
        Error::Lexical { line, message: message.into() }
    }

    pub fn syntactic<S: Into<String>>(token: Token, message: S) -> Error {
        Error::Syntactic { token, message: message.into() }
    }

    pub fn type_error<S: Into<String>>(token: Token, message: S) -> Error {
        Error::Runtime { token, fault: Fault::Type, message: message.into() }
    }

    pub fn undefined_variable(name: &Token) -> Error {
        Error::Runtime {
            token: name.clone(),
            fault: Fault::UndefinedVariable,
            message: format!("Undefined variable '{}'.", name.lexeme),
        }
    }

    pub fn is_runtime_error(&self) -> bool {
        matches!(self, Error::Runtime { .. } | Error::Io(_))
    }

    pub fn fault(&self) -> Option<Fault> {
        match self {
            Error::Runtime { fault, .. } => Some(*fault),
            _ => None,
        }
    }

    /// The 1-based source line, when the error is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Lexical { line, .. } => Some(*line),
            Error::Syntactic { token, .. } | Error::Runtime { token, .. } => Some(token.line),
            Error::Io(_) => None,
        }
    }
}

fn location(token: &Token) -> String {
    if token.is_eof() {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}
