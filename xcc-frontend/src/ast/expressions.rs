//! Expression AST nodes

use super::ops::{AssignOp, BinaryOp, UnaryOp};
use super::TypeSpec;
use serde::{Deserialize, Serialize};
use xcc_common::{SourceSpan, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: SourceSpan,
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: SourceSpan) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// Integer, char, float or string constant
    Literal(Value),

    Identifier(String),

    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    Assignment {
        op: AssignOp,
        target: Box<Expression>,
        value: Box<Expression>,
    },

    Call {
        function: String,
        arguments: Vec<Expression>,
    },

    /// `array[index]`
    Index {
        array: Box<Expression>,
        index: Box<Expression>,
    },

    Cast {
        target_type: TypeSpec,
        operand: Box<Expression>,
    },
}

/// Initializer of a declaration: one expression or a braced list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    Expression(Expression),
    List {
        items: Vec<Initializer>,
        span: SourceSpan,
    },
}

impl Initializer {
    pub fn span(&self) -> &SourceSpan {
        match self {
            Initializer::Expression(expr) => &expr.span,
            Initializer::List { span, .. } => span,
        }
    }
}
