//! Semantic analysis error definitions

use thiserror::Error;
use xcc_common::{CompilerError, PrimitiveType, SourceSpan};

/// Semantic analysis errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String, span: SourceSpan },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String, span: SourceSpan },

    #[error("Redefinition of symbol: {name}")]
    RedefinedSymbol { name: String, span: SourceSpan },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: PrimitiveType,
        found: PrimitiveType,
        span: SourceSpan,
    },

    #[error("Invalid operation {operation} on type {operand_type}")]
    InvalidOperation {
        operation: String,
        operand_type: PrimitiveType,
        span: SourceSpan,
    },

    #[error("Function {name}: expected {expected} arguments, found {found}")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: SourceSpan,
    },

    #[error("Return type mismatch: expected {expected}, found {found}")]
    ReturnTypeMismatch {
        expected: PrimitiveType,
        found: PrimitiveType,
        span: SourceSpan,
    },

    #[error("Invalid lvalue in assignment")]
    InvalidLvalue { span: SourceSpan },

    #[error("Void value used in an expression")]
    VoidValue { span: SourceSpan },

    #[error("Initializer of '{name}' is not a constant")]
    NonConstantInitializer { name: String, span: SourceSpan },

    #[error("Too many initializers for '{name}': {found} for {capacity} element(s)")]
    TooManyInitializers {
        name: String,
        capacity: usize,
        found: usize,
        span: SourceSpan,
    },

    #[error("Unsupported: {message}")]
    Unsupported { message: String, span: SourceSpan },
}

impl SemanticError {
    pub fn span(&self) -> &SourceSpan {
        match self {
            SemanticError::UndefinedVariable { span, .. }
            | SemanticError::UndefinedFunction { span, .. }
            | SemanticError::RedefinedSymbol { span, .. }
            | SemanticError::TypeMismatch { span, .. }
            | SemanticError::InvalidOperation { span, .. }
            | SemanticError::ArgumentCountMismatch { span, .. }
            | SemanticError::ReturnTypeMismatch { span, .. }
            | SemanticError::InvalidLvalue { span }
            | SemanticError::VoidValue { span }
            | SemanticError::NonConstantInitializer { span, .. }
            | SemanticError::TooManyInitializers { span, .. }
            | SemanticError::Unsupported { span, .. } => span,
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>, span: &SourceSpan) -> Self {
        SemanticError::Unsupported {
            message: message.into(),
            span: span.clone(),
        }
    }

    pub(crate) fn invalid_operation(operation: impl ToString, operand_type: PrimitiveType, span: &SourceSpan) -> Self {
        SemanticError::InvalidOperation {
            operation: operation.to_string(),
            operand_type,
            span: span.clone(),
        }
    }
}

impl From<SemanticError> for CompilerError {
    fn from(err: SemanticError) -> Self {
        CompilerError::semantic_error(err.to_string(), err.span().clone())
    }
}
