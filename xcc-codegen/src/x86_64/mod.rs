//! x86-64 realization of [`AssemblyCode`]
//!
//! Instructions are accumulated as [`AsmInst`] values in two streams, data
//! and text, and rendered once generation succeeds. Integer-family values
//! are kept in the 64-bit register sign-extended (int) or zero-extended
//! (char), so arithmetic and comparisons always run at quad width.

mod arithmetic;
mod calls;
mod data;
mod memory;


use crate::abi::X86_64;
use crate::asm::{emit_instructions, AsmInst, Operand};
use crate::code::{ArithOp, AssemblyCode, Relation, Step, UnaryOp};
use crate::error::CodegenError;
use crate::regalloc::{Reg, RegisterManager, TypeClass};
use log::warn;
use xcc_common::{CompilationContext, FunctionInfo, Initializer, PrimitiveType, ScalarType, Symbol, Value};

pub struct X86_64Code<'ctx> {
    ctx: &'ctx CompilationContext,
    registers: RegisterManager<X86_64>,
    data: Vec<AsmInst>,
    text: Vec<AsmInst>,
    /// Bytes pushed below the frame by argument pushes and call-site spills
    stack_depth: usize,
    strict_registers: bool,
}

impl<'ctx> X86_64Code<'ctx> {
    pub fn new(ctx: &'ctx CompilationContext) -> Self {
        Self {
            ctx,
            registers: RegisterManager::new(),
            data: Vec::new(),
            text: Vec::new(),
            stack_depth: 0,
            strict_registers: true,
        }
    }

    /// When disabled, registers still live at a statement boundary or a
    /// function's end are logged and reclaimed instead of failing generation.
    pub fn with_strict_registers(mut self, strict: bool) -> Self {
        self.strict_registers = strict;
        self
    }

    pub fn registers(&self) -> &RegisterManager<X86_64> {
        &self.registers
    }

    /// Text-section instructions emitted so far
    pub fn text(&self) -> &[AsmInst] {
        &self.text
    }

    pub fn data(&self) -> &[AsmInst] {
        &self.data
    }

    fn emit(&mut self, inst: AsmInst) {
        self.text.push(inst);
    }

    fn allocate(&mut self, class: TypeClass) -> Result<Reg, CodegenError> {
        self.registers.allocate(class)
    }

    /// The register under its own class name
    fn op(&self, reg: Reg) -> Result<Operand, CodegenError> {
        Ok(Operand::Reg(self.registers.name_of(reg)?))
    }

    /// The 64-bit view of an integer-family register
    fn quad(&self, reg: Reg) -> Result<Operand, CodegenError> {
        Ok(Operand::Reg(self.registers.name_of(reg.alias(TypeClass::Long)?)?))
    }

    fn dword(&self, reg: Reg) -> Result<Operand, CodegenError> {
        Ok(Operand::Reg(self.registers.name_of(reg.alias(TypeClass::Int)?)?))
    }

    fn byte(&self, reg: Reg) -> Result<Operand, CodegenError> {
        Ok(Operand::Reg(self.registers.lower_half_name_of(reg)?))
    }

    /// Both operands must be live and of one class.
    fn same_class(&self, operation: &'static str, left: Reg, right: Reg) -> Result<(), CodegenError> {
        self.registers.check(left)?;
        self.registers.check(right)?;
        if left.class != right.class {
            return Err(CodegenError::TypeMismatch {
                operation,
                left: left.class,
                right: right.class,
            });
        }
        Ok(())
    }

    fn expect_class(&self, operation: &'static str, reg: Reg, class: TypeClass) -> Result<(), CodegenError> {
        self.registers.check(reg)?;
        if reg.class != class {
            return Err(CodegenError::TypeMismatch {
                operation,
                left: reg.class,
                right: class,
            });
        }
        Ok(())
    }

    /// Fail (strict) or reclaim (lenient) registers still live at `scope`'s end.
    fn release_leaks(&mut self, scope: &str) -> Result<(), CodegenError> {
        let live = self.registers.live_count();
        if live == 0 {
            return Ok(());
        }
        if self.strict_registers {
            return Err(CodegenError::InvalidUsage(format!(
                "{live} register(s) still live at the end of {scope}"
            )));
        }
        warn!("{live} register(s) leaked at the end of {scope}, reclaiming");
        self.registers.free_all();
        Ok(())
    }
}

impl AssemblyCode for X86_64Code<'_> {
    fn preamble(&mut self) -> Result<(), CodegenError> {
        self.gen_preamble()
    }

    fn declare_global(&mut self, symbol: &Symbol, init: Option<&Initializer>) -> Result<(), CodegenError> {
        self.gen_global(symbol, init)
    }

    fn postamble(&mut self) -> Result<(), CodegenError> {
        self.release_leaks("the program")?;
        self.registers.free_all();
        self.emit(AsmInst::Directive(
            ".section .note.GNU-stack,\"\",@progbits".to_string(),
        ));
        Ok(())
    }

    fn output(&self) -> String {
        let mut out = emit_instructions(&self.data);
        out.push_str(&AsmInst::Directive(".text".to_string()).to_string());
        out.push('\n');
        out.push_str(&emit_instructions(&self.text));
        out
    }

    fn net_allocations(&self) -> isize {
        self.registers.net_allocations()
    }

    fn live_registers(&self) -> usize {
        self.registers.live_count()
    }

    fn reclaim_registers(&mut self, scope: &str) -> Result<(), CodegenError> {
        self.release_leaks(scope)
    }

    fn free(&mut self, reg: Reg) -> Result<(), CodegenError> {
        self.registers.free(reg)
    }

    fn load_immediate(&mut self, value: &Value) -> Result<Reg, CodegenError> {
        self.gen_load_immediate(value)
    }

    fn move_immediate(&mut self, reg: Reg, value: i64) -> Result<(), CodegenError> {
        self.gen_move_immediate(reg, value)
    }

    fn load_symbol(&mut self, symbol: &Symbol) -> Result<Reg, CodegenError> {
        self.gen_load_symbol(symbol)
    }

    fn store_symbol(&mut self, reg: Reg, symbol: &Symbol) -> Result<(), CodegenError> {
        self.gen_store_symbol(reg, symbol)
    }

    fn store_element(&mut self, reg: Reg, symbol: &Symbol, index: usize) -> Result<(), CodegenError> {
        self.gen_store_element(reg, symbol, index)
    }

    fn address_of(&mut self, symbol: &Symbol) -> Result<Reg, CodegenError> {
        self.gen_address_of(symbol)
    }

    fn dereference(&mut self, reg: Reg, pointer: PrimitiveType) -> Result<Reg, CodegenError> {
        self.gen_dereference(reg, pointer)
    }

    fn store_indirect(&mut self, value: Reg, address: Reg, pointer: PrimitiveType) -> Result<(), CodegenError> {
        self.gen_store_indirect(value, address, pointer)
    }

    fn element_address(&mut self, base: Reg, index: Reg, element: ScalarType) -> Result<Reg, CodegenError> {
        self.gen_element_address(base, index, element)
    }

    fn step(&mut self, symbol: &Symbol, step: Step, postfix: bool) -> Result<Reg, CodegenError> {
        self.gen_step(symbol, step, postfix)
    }

    fn binary(&mut self, op: ArithOp, left: Reg, right: Reg) -> Result<Reg, CodegenError> {
        self.gen_binary(op, left, right)
    }

    fn unary(&mut self, op: UnaryOp, reg: Reg) -> Result<Reg, CodegenError> {
        self.gen_unary(op, reg)
    }

    fn compare(&mut self, relation: Relation, left: Reg, right: Reg) -> Result<Reg, CodegenError> {
        self.gen_compare(relation, left, right)
    }

    fn compare_and_jump(&mut self, relation: Relation, left: Reg, right: Reg, label: &str) -> Result<(), CodegenError> {
        self.gen_compare_and_jump(relation, left, right, label)
    }

    fn jump_if_zero(&mut self, reg: Reg, label: &str) -> Result<(), CodegenError> {
        self.gen_zero_test_jump(reg, label, true)
    }

    fn jump_if_not_zero(&mut self, reg: Reg, label: &str) -> Result<(), CodegenError> {
        self.gen_zero_test_jump(reg, label, false)
    }

    fn jump(&mut self, label: &str) {
        self.emit(AsmInst::Jmp(label.to_string()));
    }

    fn label(&mut self, label: &str) {
        self.emit(AsmInst::Label(label.to_string()));
    }

    fn convert(&mut self, reg: Reg, from: ScalarType, to: ScalarType) -> Result<Reg, CodegenError> {
        self.gen_convert(reg, from, to)
    }

    fn function_prologue(&mut self, function: &FunctionInfo, parameters: &[Symbol]) -> Result<(), CodegenError> {
        self.gen_prologue(function, parameters)
    }

    fn function_epilogue(&mut self, function: &FunctionInfo) -> Result<(), CodegenError> {
        self.gen_epilogue(function)
    }

    fn return_value(&mut self, reg: Reg, return_type: PrimitiveType) -> Result<(), CodegenError> {
        self.gen_return_value(reg, return_type)
    }

    fn call_function(
        &mut self,
        name: &str,
        argument: Option<Reg>,
        return_type: PrimitiveType,
    ) -> Result<Option<Reg>, CodegenError> {
        self.gen_call(name, argument, return_type)
    }

    fn push_argument(&mut self, reg: Reg) -> Result<(), CodegenError> {
        self.gen_push_argument(reg)
    }

    fn call_with_arguments(
        &mut self,
        name: &str,
        arguments: &[TypeClass],
        return_type: PrimitiveType,
    ) -> Result<Option<Reg>, CodegenError> {
        self.gen_call_with_arguments(name, arguments, return_type)
    }

    fn print_array(&mut self, address: Reg, routine: &str, length: usize) -> Result<(), CodegenError> {
        self.gen_print_array(address, routine, length)
    }
}
