//! Typed statements and the translation unit

use super::expressions::TypedExpr;
use xcc_common::{FunctionInfo, Initializer, SourceLocation, Symbol};

/// Initializer of a local variable
#[derive(Debug, Clone, PartialEq)]
pub enum LocalInit {
    Scalar(TypedExpr),
    /// Leading array elements; the rest of the array is zeroed
    Elements(Vec<TypedExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmt {
    Block(Vec<TypedStmt>),

    Print {
        value: TypedExpr,
        location: SourceLocation,
    },

    Declaration {
        symbol: Symbol,
        initializer: Option<LocalInit>,
        location: SourceLocation,
    },

    Expression {
        expr: TypedExpr,
        location: SourceLocation,
    },

    If {
        condition: TypedExpr,
        then_stmt: Box<TypedStmt>,
        else_stmt: Option<Box<TypedStmt>>,
        location: SourceLocation,
    },

    While {
        condition: TypedExpr,
        body: Box<TypedStmt>,
        location: SourceLocation,
    },

    For {
        init: Option<Box<TypedStmt>>,
        condition: Option<TypedExpr>,
        update: Option<TypedExpr>,
        body: Box<TypedStmt>,
        location: SourceLocation,
    },

    Return {
        value: Option<TypedExpr>,
        location: SourceLocation,
    },

    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedGlobal {
    pub symbol: Symbol,
    /// Folded constant initializer
    pub initializer: Option<Initializer>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFunction {
    pub info: FunctionInfo,
    pub parameters: Vec<Symbol>,
    pub body: Vec<TypedStmt>,
    pub location: SourceLocation,
}

/// Globals in declaration order, then defined functions in source order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedTranslationUnit {
    pub globals: Vec<TypedGlobal>,
    pub functions: Vec<TypedFunction>,
}
