//! x86-64 System V ABI
//!
//! Register name tables for the allocatable pools, the argument and return
//! registers of the System V calling convention, and the stack frame
//! layout used by every generated function.
//!
//! Frame layout (addresses grow down):
//!
//! ```text
//!   8(%rbp)   return address
//!   0(%rbp)   saved %rbp
//!  -N(%rbp)   locals, N = stack_size
//!             saved %rbx %r12 %r13 %r14 (the integer pool)
//!   (%rsp)    16-byte aligned at every call
//! ```

use crate::asm::{Alu, AsmInst, Operand, Width};
use crate::error::CodegenError;
use crate::regalloc::{RegisterFile, TypeClass};

/// Register name tables for x86-64
pub struct X86_64;

impl X86_64 {
    /// Integer pool. Callee-saved, so pool values survive calls into C.
    const LONG_NAMES: [&'static str; 4] = ["%rbx", "%r12", "%r13", "%r14"];
    const INT_NAMES: [&'static str; 4] = ["%ebx", "%r12d", "%r13d", "%r14d"];
    const BYTE_NAMES: [&'static str; 4] = ["%bl", "%r12b", "%r13b", "%r14b"];
    /// Float pool. Caller-saved: live slots are spilled around calls.
    const FLOAT_NAMES: [&'static str; 4] = ["%xmm8", "%xmm9", "%xmm10", "%xmm11"];
}

impl RegisterFile for X86_64 {
    const INT_SLOTS: usize = 4;
    const FLOAT_SLOTS: usize = 4;

    fn name(class: TypeClass, slot: usize) -> Option<&'static str> {
        let table: &[&'static str] = match class {
            TypeClass::Int => &Self::INT_NAMES,
            TypeClass::Char => &Self::BYTE_NAMES,
            TypeClass::Long => &Self::LONG_NAMES,
            TypeClass::Float => &Self::FLOAT_NAMES,
        };
        table.get(slot).copied()
    }

    fn byte_name(slot: usize) -> Option<&'static str> {
        Self::BYTE_NAMES.get(slot).copied()
    }
}

/// System V AMD64 calling convention
pub struct CallingConvention;

impl CallingConvention {
    pub const INT_ARG_REGS: [&'static str; 6] = ["%rdi", "%rsi", "%rdx", "%rcx", "%r8", "%r9"];
    pub const FLOAT_ARG_REGS: [&'static str; 8] = [
        "%xmm0", "%xmm1", "%xmm2", "%xmm3", "%xmm4", "%xmm5", "%xmm6", "%xmm7",
    ];

    pub const INT_RETURN: &'static str = "%rax";
    pub const FLOAT_RETURN: &'static str = "%xmm0";

    /// Fixed dividend/remainder pair for `idiv`
    pub const DIVIDEND: &'static str = "%rax";
    pub const REMAINDER: &'static str = "%rdx";
    /// `sal`/`sar` take a variable count only in `%cl`
    pub const SHIFT_COUNT: &'static str = "%rcx";
    pub const SHIFT_COUNT_BYTE: &'static str = "%cl";

    pub const STACK_ALIGN: usize = 16;

    /// Callee-saved registers the prologue must preserve
    pub const SAVED: [&'static str; 4] = X86_64::LONG_NAMES;

    /// Assign argument registers by class, in order. Each class draws from
    /// its own register sequence.
    pub fn assign_arguments(classes: &[TypeClass]) -> Result<Vec<&'static str>, CodegenError> {
        let mut ints = Self::INT_ARG_REGS.iter();
        let mut floats = Self::FLOAT_ARG_REGS.iter();
        classes
            .iter()
            .enumerate()
            .map(|(i, class)| {
                let next = if class.is_integer_family() {
                    ints.next()
                } else {
                    floats.next()
                };
                next.copied().ok_or_else(|| {
                    CodegenError::UnsupportedOperation(format!(
                        "argument {} does not fit in a {class} argument register",
                        i + 1
                    ))
                })
            })
            .collect()
    }

    /// Round a byte count up to the stack alignment
    pub fn align(bytes: usize) -> usize {
        bytes.div_ceil(Self::STACK_ALIGN) * Self::STACK_ALIGN
    }
}

/// A function's stack frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Bytes reserved for locals, a multiple of 16
    pub locals_size: usize,
}

impl Frame {
    pub fn new(locals_size: usize) -> Self {
        Self {
            locals_size: CallingConvention::align(locals_size),
        }
    }

    pub fn gen_prologue(&self) -> Vec<AsmInst> {
        let mut code = vec![
            AsmInst::Push(Operand::Reg("%rbp")),
            AsmInst::Mov(Width::Quad, Operand::Reg("%rsp"), Operand::Reg("%rbp")),
        ];
        if self.locals_size > 0 {
            code.push(AsmInst::Alu(
                Alu::Sub,
                Width::Quad,
                Operand::Imm(self.locals_size as i64),
                Operand::Reg("%rsp"),
            ));
        }
        // four pushes keep %rsp 16-byte aligned
        for reg in CallingConvention::SAVED {
            code.push(AsmInst::Push(Operand::Reg(reg)));
        }
        code
    }

    pub fn gen_epilogue(&self) -> Vec<AsmInst> {
        let mut code: Vec<AsmInst> = CallingConvention::SAVED
            .iter()
            .rev()
            .map(|reg| AsmInst::Pop(Operand::Reg(reg)))
            .collect();
        code.push(AsmInst::Leave);
        code.push(AsmInst::Ret);
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_argument_assignment_by_class() {
        let regs = CallingConvention::assign_arguments(&[
            TypeClass::Int,
            TypeClass::Float,
            TypeClass::Long,
            TypeClass::Float,
        ])
        .unwrap();
        assert_eq!(regs, vec!["%rdi", "%xmm0", "%rsi", "%xmm1"]);
    }

    #[test]
    fn test_too_many_integer_arguments() {
        let classes = [TypeClass::Int; 7];
        assert!(matches!(
            CallingConvention::assign_arguments(&classes),
            Err(CodegenError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_frame_is_aligned() {
        assert_eq!(Frame::new(0).locals_size, 0);
        assert_eq!(Frame::new(4).locals_size, 16);
        assert_eq!(Frame::new(32).locals_size, 32);
    }

    #[test]
    fn test_prologue_epilogue_are_symmetric() {
        let frame = Frame::new(12);
        let prologue = frame.gen_prologue();
        assert_eq!(prologue[0], AsmInst::Push(Operand::Reg("%rbp")));
        assert_eq!(
            prologue[2],
            AsmInst::Alu(Alu::Sub, Width::Quad, Operand::Imm(16), Operand::Reg("%rsp"))
        );
        let pushed: Vec<_> = prologue
            .iter()
            .skip(3)
            .filter_map(|i| match i {
                AsmInst::Push(Operand::Reg(r)) => Some(*r),
                _ => None,
            })
            .collect();
        let popped: Vec<_> = frame
            .gen_epilogue()
            .iter()
            .filter_map(|i| match i {
                AsmInst::Pop(Operand::Reg(r)) => Some(*r),
                _ => None,
            })
            .rev()
            .collect();
        assert_eq!(pushed, popped);
        assert_eq!(frame.gen_epilogue().last(), Some(&AsmInst::Ret));
    }
}
