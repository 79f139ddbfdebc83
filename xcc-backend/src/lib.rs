//! xcc x86-64 C Compiler - Backend
//!
//! This crate walks the typed AST produced by the frontend and drives an
//! [`AssemblyCode`] emitter, producing a complete GNU assembler file.

pub mod lower;

pub use lower::Lowering;

use log::info;
use xcc_codegen::{AssemblyCode, X86_64Code};
use xcc_common::{CompilationContext, CompilerError};
use xcc_frontend::TypedTranslationUnit;

/// Options for code generation
#[derive(Debug, Clone, Copy)]
pub struct CodegenOptions {
    /// Fail when a register is still live at a statement boundary or at
    /// the end of a function, instead of reclaiming it with a warning.
    pub strict_registers: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self { strict_registers: true }
    }
}

/// Generate x86-64 assembly for a checked translation unit.
///
/// `ctx` must be the context the unit was lexed with: its float and
/// string pools become the head of the data section.
pub fn generate(
    unit: &TypedTranslationUnit,
    ctx: &CompilationContext,
    options: CodegenOptions,
) -> Result<String, CompilerError> {
    let mut code = X86_64Code::new(ctx).with_strict_registers(options.strict_registers);
    Lowering::new(&mut code).lower_unit(unit)?;
    let asm = code.output();
    info!(
        "generated {} line(s) of assembly for {} function(s)",
        asm.lines().count(),
        unit.functions.len()
    );
    Ok(asm)
}

#[cfg(test)]
mod tests;
