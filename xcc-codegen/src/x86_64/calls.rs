//! Function linkage: prologue, epilogue, returns and calls

use super::X86_64Code;
use crate::abi::{CallingConvention, Frame};
use crate::asm::{Alu, AsmInst, Operand, Sse, Width};
use crate::code::return_label;
use crate::error::CodegenError;
use crate::regalloc::{Reg, TypeClass};
use log::debug;
use xcc_common::{FunctionInfo, PrimitiveType, ScalarType, Symbol};

const SLOT: usize = 8;

impl X86_64Code<'_> {
    pub(super) fn gen_prologue(&mut self, function: &FunctionInfo, parameters: &[Symbol]) -> Result<(), CodegenError> {
        debug!(
            "prologue for {} ({} parameter(s), {} byte frame)",
            function.name,
            parameters.len(),
            function.stack_size
        );
        if i32::try_from(function.stack_size).is_err() {
            return Err(CodegenError::UnsupportedOperation(format!(
                "{} byte frame of {} exceeds a 32-bit displacement",
                function.stack_size, function.name
            )));
        }
        self.stack_depth = 0;
        self.emit(AsmInst::Directive(format!(".globl {}", function.name)));
        self.emit(AsmInst::Directive(format!(".type {}, @function", function.name)));
        self.emit(AsmInst::Label(function.name.clone()));
        for inst in Frame::new(function.stack_size).gen_prologue() {
            self.emit(inst);
        }

        // spill incoming arguments to their frame slots through the pool
        let classes = parameters
            .iter()
            .map(|p| TypeClass::of(&p.ty))
            .collect::<Result<Vec<_>, _>>()?;
        let sources = CallingConvention::assign_arguments(&classes)?;
        for (param, source) in parameters.iter().zip(sources) {
            let reg = self.allocate(TypeClass::of(&param.ty)?)?;
            self.move_from_abi(reg, source)?;
            self.gen_store_symbol(reg, param)?;
            self.registers.free(reg)?;
        }
        Ok(())
    }

    pub(super) fn gen_epilogue(&mut self, function: &FunctionInfo) -> Result<(), CodegenError> {
        if self.stack_depth != 0 {
            return Err(CodegenError::InvalidUsage(format!(
                "{} byte(s) still pushed at the end of {}",
                self.stack_depth, function.name
            )));
        }
        self.release_leaks(&function.name)?;
        // falling off the end returns 0
        self.emit(AsmInst::Alu(
            Alu::Xor,
            Width::Long,
            Operand::Reg("%eax"),
            Operand::Reg("%eax"),
        ));
        self.emit(AsmInst::Label(return_label(&function.name)));
        for inst in Frame::new(function.stack_size).gen_epilogue() {
            self.emit(inst);
        }
        self.emit(AsmInst::Directive(format!(".size {0}, .-{0}", function.name)));
        Ok(())
    }

    pub(super) fn gen_return_value(&mut self, reg: Reg, return_type: PrimitiveType) -> Result<(), CodegenError> {
        self.expect_class("return", reg, TypeClass::of(&return_type)?)?;
        let inst = if reg.class == TypeClass::Float {
            AsmInst::Sse(Sse::Movsd, self.op(reg)?, Operand::Reg(CallingConvention::FLOAT_RETURN))
        } else {
            AsmInst::Mov(Width::Quad, self.quad(reg)?, Operand::Reg(CallingConvention::INT_RETURN))
        };
        self.emit(inst);
        self.registers.free(reg)
    }

    /// Move a value between a pool register and an ABI register.
    fn move_to_abi(&mut self, reg: Reg, target: &'static str) -> Result<(), CodegenError> {
        let inst = if reg.class == TypeClass::Float {
            AsmInst::Sse(Sse::Movsd, self.op(reg)?, Operand::Reg(target))
        } else {
            AsmInst::Mov(Width::Quad, self.quad(reg)?, Operand::Reg(target))
        };
        self.emit(inst);
        Ok(())
    }

    fn move_from_abi(&mut self, reg: Reg, source: &'static str) -> Result<(), CodegenError> {
        let inst = if reg.class == TypeClass::Float {
            AsmInst::Sse(Sse::Movsd, Operand::Reg(source), self.op(reg)?)
        } else {
            AsmInst::Mov(Width::Quad, Operand::Reg(source), self.quad(reg)?)
        };
        self.emit(inst);
        Ok(())
    }

    pub(super) fn gen_call(
        &mut self,
        name: &str,
        argument: Option<Reg>,
        return_type: PrimitiveType,
    ) -> Result<Option<Reg>, CodegenError> {
        if let Some(arg) = argument {
            self.registers.check(arg)?;
            let target = CallingConvention::assign_arguments(&[arg.class])?[0];
            self.move_to_abi(arg, target)?;
            self.registers.free(arg)?;
        }
        self.emit_call(name, return_type)
    }

    pub(super) fn gen_push_argument(&mut self, reg: Reg) -> Result<(), CodegenError> {
        self.registers.check(reg)?;
        if reg.class == TypeClass::Float {
            self.push_float(reg)?;
        } else {
            self.emit(AsmInst::Push(self.quad(reg)?));
            self.stack_depth += SLOT;
        }
        self.registers.free(reg)
    }

    pub(super) fn gen_call_with_arguments(
        &mut self,
        name: &str,
        arguments: &[TypeClass],
        return_type: PrimitiveType,
    ) -> Result<Option<Reg>, CodegenError> {
        let targets = CallingConvention::assign_arguments(arguments)?;
        if arguments.len() * SLOT > self.stack_depth {
            return Err(CodegenError::InvalidUsage(format!(
                "call to {name} expects {} pushed argument(s)",
                arguments.len()
            )));
        }
        for (class, target) in arguments.iter().zip(targets).rev() {
            if *class == TypeClass::Float {
                self.emit(AsmInst::Sse(Sse::Movsd, Operand::Mem("(%rsp)".to_string()), Operand::Reg(target)));
                self.emit(AsmInst::Alu(Alu::Add, Width::Quad, Operand::Imm(SLOT as i64), Operand::Reg("%rsp")));
            } else {
                self.emit(AsmInst::Pop(Operand::Reg(target)));
            }
            self.stack_depth -= SLOT;
        }
        self.emit_call(name, return_type)
    }

    pub(super) fn gen_print_array(&mut self, address: Reg, routine: &str, length: usize) -> Result<(), CodegenError> {
        self.expect_class("print array", address, TypeClass::Long)?;
        let [data, count] = [CallingConvention::INT_ARG_REGS[0], CallingConvention::INT_ARG_REGS[1]];
        self.move_to_abi(address, data)?;
        self.emit(AsmInst::Mov(Width::Quad, Operand::Imm(length as i64), Operand::Reg(count)));
        self.registers.free(address)?;
        self.emit_call(routine, PrimitiveType::Void)?;
        Ok(())
    }

    fn push_float(&mut self, reg: Reg) -> Result<(), CodegenError> {
        self.emit(AsmInst::Alu(Alu::Sub, Width::Quad, Operand::Imm(SLOT as i64), Operand::Reg("%rsp")));
        self.emit(AsmInst::Sse(Sse::Movsd, self.op(reg)?, Operand::Mem("(%rsp)".to_string())));
        self.stack_depth += SLOT;
        Ok(())
    }

    fn pop_float(&mut self, reg: Reg) -> Result<(), CodegenError> {
        self.emit(AsmInst::Sse(Sse::Movsd, Operand::Mem("(%rsp)".to_string()), self.op(reg)?));
        self.emit(AsmInst::Alu(Alu::Add, Width::Quad, Operand::Imm(SLOT as i64), Operand::Reg("%rsp")));
        self.stack_depth -= SLOT;
        Ok(())
    }

    /// Emit the call itself: spill live float slots (caller-saved), align
    /// the stack, call, restore, and collect the return value.
    fn emit_call(&mut self, name: &str, return_type: PrimitiveType) -> Result<Option<Reg>, CodegenError> {
        debug!("call {name}");
        let live_floats = self.registers.live(TypeClass::Float);
        for reg in &live_floats {
            self.push_float(*reg)?;
        }
        let padding = self.stack_depth % CallingConvention::STACK_ALIGN;
        if padding != 0 {
            self.emit(AsmInst::Alu(Alu::Sub, Width::Quad, Operand::Imm(padding as i64), Operand::Reg("%rsp")));
        }
        self.emit(AsmInst::Call(name.to_string()));
        if padding != 0 {
            self.emit(AsmInst::Alu(Alu::Add, Width::Quad, Operand::Imm(padding as i64), Operand::Reg("%rsp")));
        }
        for reg in live_floats.iter().rev() {
            self.pop_float(*reg)?;
        }

        if return_type.is_void() {
            return Ok(None);
        }
        let result = self.allocate(TypeClass::of(&return_type)?)?;
        let inst = match return_type {
            PrimitiveType::Scalar(ScalarType::Float) => AsmInst::Sse(
                Sse::Movsd,
                Operand::Reg(CallingConvention::FLOAT_RETURN),
                self.op(result)?,
            ),
            PrimitiveType::Scalar(ScalarType::Int) => {
                AsmInst::MovSx(Width::Long, Width::Quad, Operand::Reg("%eax"), self.quad(result)?)
            }
            PrimitiveType::Scalar(ScalarType::Char) => {
                AsmInst::MovZx(Width::Byte, Width::Quad, Operand::Reg("%al"), self.quad(result)?)
            }
            _ => AsmInst::Mov(Width::Quad, Operand::Reg(CallingConvention::INT_RETURN), self.quad(result)?),
        };
        self.emit(inst);
        Ok(Some(result))
    }
}
