//! Data section: constant pools and global storage

use super::X86_64Code;
use crate::asm::AsmInst;
use crate::error::CodegenError;
use log::debug;
use xcc_common::{Initializer, PrimitiveType, ScalarType, Symbol, Value};

impl X86_64Code<'_> {
    pub(super) fn gen_preamble(&mut self) -> Result<(), CodegenError> {
        self.registers.free_all();
        self.stack_depth = 0;
        self.data.push(AsmInst::Directive(".data".to_string()));

        let ctx = self.ctx;
        for (value, label) in ctx.floats() {
            self.data.push(AsmInst::Directive(".balign 8".to_string()));
            self.data.push(AsmInst::Label(label.to_string()));
            self.data.push(AsmInst::Directive(format!(".double {value:?}")));
        }
        for (value, label) in ctx.strings() {
            self.data.push(AsmInst::Label(label.to_string()));
            self.data.push(AsmInst::Directive(format!(".string \"{}\"", escape(value))));
        }
        Ok(())
    }

    pub(super) fn gen_global(&mut self, symbol: &Symbol, init: Option<&Initializer>) -> Result<(), CodegenError> {
        if !symbol.is_global() {
            return Err(CodegenError::InvalidUsage(format!(
                "{} lives at {} and has no data-section storage",
                symbol.name, symbol.address
            )));
        }
        let (element, capacity) = match symbol.ty {
            PrimitiveType::Void => return Err(CodegenError::unsupported_type("global declaration", symbol.ty)),
            PrimitiveType::Array { element, length } => (PrimitiveType::Scalar(element), length),
            scalar_or_pointer => (scalar_or_pointer, 1),
        };
        let values = init.map(|i| i.flatten()).unwrap_or_default();
        if values.len() > capacity {
            return Err(CodegenError::UnsupportedOperation(format!(
                "{} initializers for {} of {capacity} element(s)",
                values.len(),
                symbol.name
            )));
        }
        debug!("global {}: {} ({} initialized)", symbol.name, symbol.ty, values.len());

        let mut directives = Vec::with_capacity(values.len() + 4);
        directives.push(AsmInst::Directive(format!(".globl {}", symbol.name)));
        directives.push(AsmInst::Directive(format!(".balign {}", symbol.ty.align())));
        directives.push(AsmInst::Label(symbol.name.clone()));
        for value in &values {
            directives.push(AsmInst::Directive(self.data_directive(element, value)?));
        }
        let remaining = capacity - values.len();
        if remaining > 0 {
            directives.push(AsmInst::Directive(format!(".zero {}", remaining * element.size())));
        }
        self.data.extend(directives);
        Ok(())
    }

    /// One typed constant directive for a slot of type `slot`
    fn data_directive(&self, slot: PrimitiveType, value: &Value) -> Result<String, CodegenError> {
        let invalid = || CodegenError::UnsupportedOperation(format!("cannot initialize {slot} with {value}"));
        match slot {
            PrimitiveType::Scalar(ScalarType::Float) => match value.convert(ScalarType::Float) {
                Some(Value::Float(f)) => Ok(format!(".double {f:?}")),
                _ => Err(invalid()),
            },
            PrimitiveType::Scalar(scalar) => {
                let n = value.convert(scalar).and_then(|v| v.as_i64()).ok_or_else(invalid)?;
                let directive = match scalar {
                    ScalarType::Char => ".byte",
                    ScalarType::Int => ".long",
                    _ => ".quad",
                };
                Ok(format!("{directive} {n}"))
            }
            PrimitiveType::Pointer(_) => match value {
                Value::Str(s) => {
                    let label = self.ctx.string_label(s).ok_or_else(|| {
                        CodegenError::InvalidUsage(format!("string {s:?} was never pooled"))
                    })?;
                    Ok(format!(".quad {label}"))
                }
                other => other.as_i64().map(|n| format!(".quad {n}")).ok_or_else(invalid),
            },
            _ => Err(invalid()),
        }
    }
}

/// Escape a string for a GNU `as` `.string` directive
pub(super) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            other => out.push_str(&format!("\\{other:03o}")),
        }
    }
    out
}
