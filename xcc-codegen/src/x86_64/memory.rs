//! Loads, stores and address arithmetic

use super::X86_64Code;
use crate::asm::{Alu, AsmInst, Operand, Sse, Width};
use crate::code::Step;
use crate::error::CodegenError;
use crate::regalloc::{Reg, TypeClass};
use log::trace;
use xcc_common::{PrimitiveType, ScalarType, Symbol, Value};

impl X86_64Code<'_> {
    pub(super) fn gen_load_immediate(&mut self, value: &Value) -> Result<Reg, CodegenError> {
        trace!("load immediate {value}");
        match value {
            Value::Int(v) => self.load_integer(TypeClass::Int, i64::from(*v)),
            Value::Char(v) => self.load_integer(TypeClass::Char, i64::from(*v)),
            Value::Long(v) => self.load_integer(TypeClass::Long, *v),
            Value::Float(f) => {
                let label = self
                    .ctx
                    .float_label(*f)
                    .ok_or_else(|| CodegenError::InvalidUsage(format!("float {f:?} was never pooled")))?
                    .to_string();
                let reg = self.allocate(TypeClass::Float)?;
                let dst = self.op(reg)?;
                self.emit(AsmInst::Sse(Sse::Movsd, Operand::Mem(format!("{label}(%rip)")), dst));
                Ok(reg)
            }
            Value::Str(s) => {
                let label = self
                    .ctx
                    .string_label(s)
                    .ok_or_else(|| CodegenError::InvalidUsage(format!("string {s:?} was never pooled")))?
                    .to_string();
                let reg = self.allocate(TypeClass::Long)?;
                let dst = self.op(reg)?;
                self.emit(AsmInst::Lea(Operand::Mem(format!("{label}(%rip)")), dst));
                Ok(reg)
            }
        }
    }

    fn load_integer(&mut self, class: TypeClass, value: i64) -> Result<Reg, CodegenError> {
        let reg = self.allocate(class)?;
        self.gen_move_immediate(reg, value)?;
        Ok(reg)
    }

    pub(super) fn gen_move_immediate(&mut self, reg: Reg, value: i64) -> Result<(), CodegenError> {
        let dst = self.quad(reg)?;
        if i32::try_from(value).is_ok() {
            self.emit(AsmInst::Mov(Width::Quad, Operand::Imm(value), dst));
        } else {
            self.emit(AsmInst::Movabs(value, dst));
        }
        Ok(())
    }

    /// Load a scalar or pointer of type `ty` from `src` into a fresh register.
    fn load_from(&mut self, ty: PrimitiveType, src: Operand) -> Result<Reg, CodegenError> {
        let class = TypeClass::of(&ty)?;
        let reg = self.allocate(class)?;
        self.load_into(reg, ty, src)?;
        Ok(reg)
    }

    /// Load into an already allocated register, widening integers to 64 bits.
    fn load_into(&mut self, reg: Reg, ty: PrimitiveType, src: Operand) -> Result<(), CodegenError> {
        let inst = match ty {
            PrimitiveType::Scalar(ScalarType::Char) => AsmInst::MovZx(Width::Byte, Width::Quad, src, self.quad(reg)?),
            PrimitiveType::Scalar(ScalarType::Int) => AsmInst::MovSx(Width::Long, Width::Quad, src, self.quad(reg)?),
            PrimitiveType::Scalar(ScalarType::Long) | PrimitiveType::Pointer(_) => {
                AsmInst::Mov(Width::Quad, src, self.quad(reg)?)
            }
            PrimitiveType::Scalar(ScalarType::Float) => AsmInst::Sse(Sse::Movsd, src, self.op(reg)?),
            other => return Err(CodegenError::unsupported_type("load", other)),
        };
        self.emit(inst);
        Ok(())
    }

    /// Store `reg` as a value of type `ty` at `dst`, at the width of `ty`.
    fn store_to(&mut self, reg: Reg, ty: PrimitiveType, dst: Operand) -> Result<(), CodegenError> {
        let expected = match ty {
            PrimitiveType::Void | PrimitiveType::Array { .. } => {
                return Err(CodegenError::unsupported_type("store", ty))
            }
            other => TypeClass::of(&other)?,
        };
        self.expect_class("store", reg, expected)?;
        let inst = match ty {
            PrimitiveType::Scalar(ScalarType::Char) => AsmInst::Mov(Width::Byte, self.byte(reg)?, dst),
            PrimitiveType::Scalar(ScalarType::Int) => AsmInst::Mov(Width::Long, self.dword(reg)?, dst),
            PrimitiveType::Scalar(ScalarType::Float) => AsmInst::Sse(Sse::Movsd, self.op(reg)?, dst),
            _ => AsmInst::Mov(Width::Quad, self.quad(reg)?, dst),
        };
        self.emit(inst);
        Ok(())
    }

    pub(super) fn gen_load_symbol(&mut self, symbol: &Symbol) -> Result<Reg, CodegenError> {
        trace!("load {} : {}", symbol.name, symbol.ty);
        let src = Operand::Mem(symbol.address.at(0));
        match symbol.ty {
            // arrays decay to the address of their first element
            PrimitiveType::Array { .. } => self.gen_address_of(symbol),
            ty => self.load_from(ty, src),
        }
    }

    pub(super) fn gen_store_symbol(&mut self, reg: Reg, symbol: &Symbol) -> Result<(), CodegenError> {
        trace!("store {} : {}", symbol.name, symbol.ty);
        self.store_to(reg, symbol.ty, Operand::Mem(symbol.address.at(0)))
    }

    pub(super) fn gen_store_element(&mut self, reg: Reg, symbol: &Symbol, index: usize) -> Result<(), CodegenError> {
        let PrimitiveType::Array { element, length } = symbol.ty else {
            return Err(CodegenError::unsupported_type("element store", symbol.ty));
        };
        if index >= length {
            return Err(CodegenError::InvalidUsage(format!(
                "element {index} is past the end of {}[{length}]",
                symbol.name
            )));
        }
        let offset = index
            .checked_mul(element.size())
            .and_then(|offset| i32::try_from(offset).ok())
            .ok_or_else(|| {
                CodegenError::UnsupportedOperation(format!(
                    "element {index} of {} is beyond a 32-bit displacement",
                    symbol.name
                ))
            })?;
        self.store_to(reg, element.into(), Operand::Mem(symbol.address.at(offset)))
    }

    pub(super) fn gen_address_of(&mut self, symbol: &Symbol) -> Result<Reg, CodegenError> {
        let reg = self.allocate(TypeClass::Long)?;
        let dst = self.op(reg)?;
        self.emit(AsmInst::Lea(Operand::Mem(symbol.address.at(0)), dst));
        Ok(reg)
    }

    pub(super) fn gen_dereference(&mut self, reg: Reg, pointer: PrimitiveType) -> Result<Reg, CodegenError> {
        let target = pointer
            .element()
            .ok_or_else(|| CodegenError::unsupported_type("dereference", pointer))?;
        self.expect_class("dereference", reg, TypeClass::Long)?;
        let src = Operand::indirect(self.registers.name_of(reg)?);
        if target == ScalarType::Float {
            // an address slot cannot hold a float; load into a fresh one
            let value = self.allocate(TypeClass::Float)?;
            self.load_into(value, target.into(), src)?;
            self.registers.free(reg)?;
            Ok(value)
        } else {
            self.load_into(reg, target.into(), src)?;
            reg.alias(TypeClass::of(&target.into())?)
        }
    }

    pub(super) fn gen_store_indirect(
        &mut self,
        value: Reg,
        address: Reg,
        pointer: PrimitiveType,
    ) -> Result<(), CodegenError> {
        let target = pointer
            .element()
            .ok_or_else(|| CodegenError::unsupported_type("indirect store", pointer))?;
        self.expect_class("indirect store", address, TypeClass::Long)?;
        let dst = Operand::indirect(self.registers.name_of(address)?);
        self.store_to(value, target.into(), dst)?;
        self.registers.free(address)
    }

    pub(super) fn gen_element_address(
        &mut self,
        base: Reg,
        index: Reg,
        element: ScalarType,
    ) -> Result<Reg, CodegenError> {
        self.expect_class("element address", base, TypeClass::Long)?;
        self.expect_class("element address", index, TypeClass::Long)?;
        let b = self.registers.name_of(base)?;
        let i = self.registers.name_of(index)?;
        let addr = Operand::Mem(format!("({b},{i},{})", element.size()));
        self.emit(AsmInst::Lea(addr, Operand::Reg(b)));
        self.registers.free(index)?;
        Ok(base)
    }

    pub(super) fn gen_step(&mut self, symbol: &Symbol, step: Step, postfix: bool) -> Result<Reg, CodegenError> {
        let amount = match symbol.ty {
            PrimitiveType::Scalar(s) if s.is_integer() => 1,
            PrimitiveType::Pointer(element) => element.size() as i64,
            other => return Err(CodegenError::unsupported_type("increment/decrement", other)),
        };
        let alu = match step {
            Step::Increment => Alu::Add,
            Step::Decrement => Alu::Sub,
        };
        let value = self.gen_load_symbol(symbol)?;
        let updated = if postfix {
            let copy = self.allocate(value.class)?;
            self.emit(AsmInst::Mov(Width::Quad, self.quad(value)?, self.quad(copy)?));
            copy
        } else {
            value
        };
        self.emit(AsmInst::Alu(alu, Width::Quad, Operand::Imm(amount), self.quad(updated)?));
        self.normalize(updated)?;
        self.gen_store_symbol(updated, symbol)?;
        if postfix {
            self.registers.free(updated)?;
        }
        Ok(value)
    }

    /// Restore the extension invariant after a 64-bit operation on a
    /// narrower value: ints sign-extended, chars zero-extended.
    pub(super) fn normalize(&mut self, reg: Reg) -> Result<(), CodegenError> {
        match reg.class {
            TypeClass::Int => {
                self.emit(AsmInst::MovSx(Width::Long, Width::Quad, self.dword(reg)?, self.quad(reg)?));
            }
            TypeClass::Char => {
                self.emit(AsmInst::MovZx(Width::Byte, Width::Quad, self.byte(reg)?, self.quad(reg)?));
            }
            TypeClass::Long | TypeClass::Float => {}
        }
        Ok(())
    }
}
