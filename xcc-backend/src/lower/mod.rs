//! Typed AST lowering
//!
//! A single recursive walk over the checked tree. Expressions evaluate into
//! registers handed out by the emitter; statements own every register they
//! obtain and release it before the next statement starts. Control flow is
//! built from labels numbered per statement kind.

mod conditions;
mod expressions;
mod functions;
mod globals;
mod statements;

use log::debug;
use xcc_codegen::{ArithOp, AssemblyCode, CodegenError, Relation, UnaryOp};
use xcc_common::{CompilerError, FunctionInfo, LabelGenerator, SourceLocation};
use xcc_frontend::{BinaryOp, TypedTranslationUnit};

pub struct Lowering<'a, C: AssemblyCode> {
    code: &'a mut C,
    labels: LabelGenerator,
    /// Function whose body is being walked
    function: Option<FunctionInfo>,
}

impl<'a, C: AssemblyCode> Lowering<'a, C> {
    pub fn new(code: &'a mut C) -> Self {
        Self {
            code,
            labels: LabelGenerator::new(),
            function: None,
        }
    }

    /// Emit a whole unit: data section, then every function in order.
    pub fn lower_unit(&mut self, unit: &TypedTranslationUnit) -> Result<(), CompilerError> {
        debug!(
            "lowering {} global(s) and {} function(s)",
            unit.globals.len(),
            unit.functions.len()
        );
        located(self.code.preamble(), &SourceLocation::dummy())?;
        for global in &unit.globals {
            self.lower_global(global)?;
        }
        for function in &unit.functions {
            self.lower_function(function)?;
        }
        located(self.code.postamble(), &SourceLocation::dummy())
    }

    /// Registers must not survive a statement. The emitter's leak policy
    /// decides between failing and reclaiming.
    pub(crate) fn check_statement_boundary(&mut self, location: &SourceLocation) -> Result<(), CompilerError> {
        let scope = format!("the statement at {location}");
        located(self.code.reclaim_registers(&scope), location)
    }
}

/// Attach the statement's location to an emitter failure.
pub(crate) fn located<T>(result: Result<T, CodegenError>, location: &SourceLocation) -> Result<T, CompilerError> {
    result.map_err(|err| CompilerError::codegen_error(err.to_string(), location.clone()))
}

fn relation(op: BinaryOp) -> Result<Relation, CodegenError> {
    Ok(match op {
        BinaryOp::Equal => Relation::Eq,
        BinaryOp::NotEqual => Relation::Ne,
        BinaryOp::Less => Relation::Lt,
        BinaryOp::LessEqual => Relation::Le,
        BinaryOp::Greater => Relation::Gt,
        BinaryOp::GreaterEqual => Relation::Ge,
        other => return Err(CodegenError::UnsupportedOperation(format!("'{other}' is not a comparison"))),
    })
}

fn arithmetic(op: BinaryOp) -> Result<ArithOp, CodegenError> {
    Ok(match op {
        BinaryOp::Add => ArithOp::Add,
        BinaryOp::Sub => ArithOp::Sub,
        BinaryOp::Mul => ArithOp::Mul,
        BinaryOp::Div => ArithOp::Div,
        BinaryOp::Mod => ArithOp::Mod,
        BinaryOp::BitAnd => ArithOp::BitAnd,
        BinaryOp::BitOr => ArithOp::BitOr,
        BinaryOp::BitXor => ArithOp::BitXor,
        BinaryOp::LeftShift => ArithOp::Shl,
        BinaryOp::RightShift => ArithOp::Shr,
        other => return Err(CodegenError::UnsupportedOperation(format!("'{other}' is not arithmetic"))),
    })
}

fn unary(op: xcc_frontend::UnaryOp) -> Result<UnaryOp, CodegenError> {
    use xcc_frontend::UnaryOp as Ast;
    Ok(match op {
        Ast::Minus => UnaryOp::Negate,
        Ast::BitNot => UnaryOp::Invert,
        Ast::LogicalNot => UnaryOp::Not,
        other => return Err(CodegenError::UnsupportedOperation(format!("unary '{other}' in a value"))),
    })
}
