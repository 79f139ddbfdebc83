//! Function bodies

use super::{located, Lowering};
use log::debug;
use xcc_codegen::AssemblyCode;
use xcc_common::CompilerError;
use xcc_frontend::TypedFunction;

impl<C: AssemblyCode> Lowering<'_, C> {
    /// Prologue, body, then the epilogue behind the shared return label.
    pub(super) fn lower_function(&mut self, function: &TypedFunction) -> Result<(), CompilerError> {
        debug!(
            "lowering function {} ({} statement(s), {} byte frame)",
            function.info.name,
            function.body.len(),
            function.info.stack_size
        );
        located(
            self.code.function_prologue(&function.info, &function.parameters),
            &function.location,
        )?;
        self.function = Some(function.info.clone());
        for stmt in &function.body {
            self.lower_statement(stmt)?;
        }
        self.function = None;
        located(self.code.function_epilogue(&function.info), &function.location)
    }
}
