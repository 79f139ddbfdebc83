//! Statement AST nodes and top-level items

use super::expressions::{Expression, Initializer};
use super::TypeSpec;
use serde::{Deserialize, Serialize};
use xcc_common::SourceSpan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    Expression(Expression),

    /// Block
    Compound(Vec<Statement>),

    /// One declaration statement may declare several names
    Declaration(Vec<Declaration>),

    /// `print expr;`
    Print(Expression),

    If {
        condition: Expression,
        then_stmt: Box<Statement>,
        else_stmt: Option<Box<Statement>>,
    },

    While {
        condition: Expression,
        body: Box<Statement>,
    },

    For {
        /// Declaration or expression statement
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Expression>,
        body: Box<Statement>,
    },

    Return(Option<Expression>),

    /// Just a semicolon
    Empty,
}

/// Variable declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub decl_type: TypeSpec,
    pub initializer: Option<Initializer>,
    pub span: SourceSpan,
}

/// Function definition, or a prototype when `body` is absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub return_type: TypeSpec,
    pub parameters: Vec<Parameter>,
    pub body: Option<Statement>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: TypeSpec,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub items: Vec<TopLevelItem>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopLevelItem {
    Function(FunctionDefinition),
    Declaration(Vec<Declaration>),
}
