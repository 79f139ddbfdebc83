//! Error handling for the xcc compiler
//!
//! Every stage has its own error enum; all of them fold into
//! [`CompilerError`] at the crate boundary so the driver can report a
//! single diagnostic and abort the compilation unit.

use crate::source_loc::{SourceLocation, SourceSpan};
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Lexical error at {location}: {message}")]
    LexError {
        location: SourceLocation,
        message: String,
    },

    #[error("Parse error at {location}: {message}")]
    ParseError {
        location: SourceLocation,
        message: String,
    },

    #[error("Semantic error at {span}: {message}")]
    SemanticError {
        span: SourceSpan,
        message: String,
    },

    #[error("Code generation error at {location}: {message}")]
    CodegenError {
        location: SourceLocation,
        message: String,
    },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Internal compiler error: {message}")]
    InternalError { message: String },
}

impl CompilerError {
    /// Create a lexer error
    pub fn lexer_error(message: String, location: SourceLocation) -> Self {
        CompilerError::LexError { location, message }
    }

    /// Create a parse error
    pub fn parse_error(message: String, location: SourceLocation) -> Self {
        CompilerError::ParseError { location, message }
    }

    /// Create a semantic error
    pub fn semantic_error(message: String, span: SourceSpan) -> Self {
        CompilerError::SemanticError { span, message }
    }

    /// Create a codegen error
    pub fn codegen_error(message: String, location: SourceLocation) -> Self {
        CompilerError::CodegenError { location, message }
    }

    /// Which compiler stage produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            CompilerError::LexError { .. } => "lexer",
            CompilerError::ParseError { .. } => "parser",
            CompilerError::SemanticError { .. } => "semantic analysis",
            CompilerError::CodegenError { .. } => "code generation",
            CompilerError::IoError { .. } => "io",
            CompilerError::InternalError { .. } => "internal",
        }
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::InternalError { message }
    }
}
