//! Global storage

use super::{located, Lowering};
use log::trace;
use xcc_codegen::AssemblyCode;
use xcc_common::CompilerError;
use xcc_frontend::TypedGlobal;

impl<C: AssemblyCode> Lowering<'_, C> {
    pub(super) fn lower_global(&mut self, global: &TypedGlobal) -> Result<(), CompilerError> {
        trace!("global {} at {}", global.symbol.name, global.location);
        located(
            self.code.declare_global(&global.symbol, global.initializer.as_ref()),
            &global.location,
        )
    }
}
