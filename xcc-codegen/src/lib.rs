//! xcc x86-64 C Compiler - Code Generation
//!
//! The machine-level half of the backend:
//!
//! - the x86-64 instruction model and its AT&T renderer
//! - the typed, aliasing register manager
//! - the System V calling convention and frame layout
//! - the [`AssemblyCode`] emitter contract and its x86-64 realization
//!
//! The AST walker that drives the emitter lives in `xcc-backend`.

pub mod abi;
pub mod asm;
pub mod code;
pub mod error;
pub mod regalloc;
pub mod x86_64;

pub use asm::{emit_instructions, AsmInst};
pub use code::{return_label, ArithOp, AssemblyCode, Relation, Step, UnaryOp};
pub use error::CodegenError;
pub use regalloc::{Reg, RegisterFile, RegisterManager, TypeClass};
pub use x86_64::X86_64Code;
