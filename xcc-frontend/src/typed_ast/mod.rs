//! Typed AST representation
//!
//! Produced by semantic analysis and consumed by the lowering walker. Every
//! name is resolved to a [`Symbol`](xcc_common::Symbol) carrying its type and
//! storage, implicit conversions are explicit `Convert` nodes, and pointer
//! arithmetic is an explicit, scaled `PointerOffset`.

mod expressions;
mod statements;

pub use expressions::{LValue, TypedExpr};
pub use statements::{LocalInit, TypedFunction, TypedGlobal, TypedStmt, TypedTranslationUnit};
