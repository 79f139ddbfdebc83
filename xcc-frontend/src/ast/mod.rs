//! Abstract syntax tree
//!
//! Built by the parser, consumed by semantic analysis. Every node derives
//! `Serialize` so `xcc compile --emit-ast` can dump the tree as JSON.

pub mod expressions;
pub mod ops;
pub mod statements;

pub use expressions::{Expression, ExpressionKind, Initializer};
pub use ops::{AssignOp, BinaryOp, UnaryOp};
pub use statements::{
    Declaration, FunctionDefinition, Parameter, Statement, StatementKind, TopLevelItem, TranslationUnit,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base type keyword of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    Void,
    Char,
    Int,
    Long,
    /// `float` and `double` are both 64-bit here
    Float,
}

/// A type as written: base keyword, pointer stars, optional array length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSpec {
    pub base: BaseType,
    pub pointer_depth: u8,
    pub array_length: Option<usize>,
}

impl TypeSpec {
    pub fn new(base: BaseType) -> Self {
        Self {
            base,
            pointer_depth: 0,
            array_length: None,
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base {
            BaseType::Void => "void",
            BaseType::Char => "char",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Float => "float",
        };
        write!(f, "{base}")?;
        for _ in 0..self.pointer_depth {
            write!(f, "*")?;
        }
        if let Some(length) = self.array_length {
            write!(f, "[{length}]")?;
        }
        Ok(())
    }
}
