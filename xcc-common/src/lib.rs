//! xcc x86-64 C Compiler - Common Types and Utilities
//!
//! Shared data model used by every stage of the compiler: the umbrella
//! error type, source locations, primitive types and values, resolved
//! symbols, and the per-unit constant pools.

pub mod context;
pub mod error;
pub mod source_loc;
pub mod types;

pub use context::CompilationContext;
pub use error::CompilerError;
pub use source_loc::{SourceLocation, SourceSpan, SourceTracker};
pub use types::*;
