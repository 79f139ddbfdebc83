use crate::regalloc::TypeClass;
use thiserror::Error;

/// Failures raised while emitting code. Any of them aborts the unit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error("no free {class} register (no spilling)")]
    ResourceExhausted { class: TypeClass },

    #[error("invalid register usage: {0}")]
    InvalidUsage(String),

    #[error("register slot {slot} out of range for class {class}")]
    OutOfRange { class: TypeClass, slot: usize },

    #[error("type mismatch in {operation}: {left} and {right}")]
    TypeMismatch {
        operation: &'static str,
        left: TypeClass,
        right: TypeClass,
    },

    #[error("unsupported type {ty} for {operation}")]
    UnsupportedType { operation: &'static str, ty: String },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl CodegenError {
    pub fn unsupported_type(operation: &'static str, ty: impl ToString) -> Self {
        CodegenError::UnsupportedType {
            operation,
            ty: ty.to_string(),
        }
    }
}
