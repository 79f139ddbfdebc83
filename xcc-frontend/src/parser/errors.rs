//! Parse error types

use crate::lexer::Token;
use thiserror::Error;
use xcc_common::{CompilerError, SourceLocation};

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("Expected {expected}, found {}", found.token_type)]
    UnexpectedToken { expected: String, found: Token },

    #[error("Unexpected end of file, expected {expected}")]
    UnexpectedEndOfFile {
        expected: String,
        location: SourceLocation,
    },

    #[error("{message}")]
    InvalidExpression {
        message: String,
        location: SourceLocation,
    },

    #[error("{message}")]
    InvalidType {
        message: String,
        location: SourceLocation,
    },
}

impl ParseError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            ParseError::UnexpectedToken { found, .. } => &found.span.start,
            ParseError::UnexpectedEndOfFile { location, .. }
            | ParseError::InvalidExpression { location, .. }
            | ParseError::InvalidType { location, .. } => location,
        }
    }
}

impl From<ParseError> for CompilerError {
    fn from(err: ParseError) -> Self {
        CompilerError::parse_error(err.to_string(), err.location().clone())
    }
}
