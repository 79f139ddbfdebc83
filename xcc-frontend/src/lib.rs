//! xcc x86-64 C Compiler - Frontend
//!
//! This crate provides the frontend components of the compiler:
//! - Lexer: tokenizes source text, pooling float and string constants
//! - Parser: builds the AST from tokens
//! - AST: abstract syntax tree definitions
//! - Semantic analysis: symbol resolution, type checking and implicit
//!   conversions, producing the typed AST

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod typed_ast;

pub use ast::{
    BinaryOp, Declaration, Expression, ExpressionKind, FunctionDefinition, Statement, StatementKind, TopLevelItem,
    TranslationUnit, UnaryOp,
};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{ParseError, Parser};
pub use semantic::{SemanticAnalyzer, SemanticError};
pub use typed_ast::{LValue, LocalInit, TypedExpr, TypedFunction, TypedGlobal, TypedStmt, TypedTranslationUnit};

use log::info;
use xcc_common::{CompilationContext, CompilerError};

/// High-level frontend interface
pub struct Frontend;

impl Frontend {
    /// Tokenize source code. Float and string literals are pooled in `ctx`.
    pub fn tokenize(source: &str, filename: &str, ctx: &mut CompilationContext) -> Result<Vec<Token>, CompilerError> {
        Lexer::new(source, filename, ctx).tokenize()
    }

    /// Parse source code into an AST
    pub fn parse_source(source: &str, filename: &str, ctx: &mut CompilationContext) -> Result<TranslationUnit, CompilerError> {
        let tokens = Self::tokenize(source, filename, ctx)?;
        let ast = Parser::new(tokens).parse_translation_unit()?;
        info!("parsed {filename}: {} top-level item(s)", ast.items.len());
        Ok(ast)
    }

    /// Check a parsed unit and produce the typed AST
    pub fn analyze(ast: &TranslationUnit) -> Result<TypedTranslationUnit, CompilerError> {
        SemanticAnalyzer::new().analyze(ast)
    }

    /// Parse and analyze source code
    pub fn analyze_source(
        source: &str,
        filename: &str,
        ctx: &mut CompilationContext,
    ) -> Result<TypedTranslationUnit, CompilerError> {
        let ast = Self::parse_source(source, filename, ctx)?;
        Self::analyze(&ast)
    }
}
