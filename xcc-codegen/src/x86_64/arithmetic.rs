//! Arithmetic, comparisons, conditional jumps and conversions

use super::X86_64Code;
use crate::abi::CallingConvention;
use crate::asm::{Alu, AsmInst, Cond, Operand, Sse, Width};
use crate::code::{ArithOp, Relation, UnaryOp};
use crate::error::CodegenError;
use crate::regalloc::{Reg, TypeClass};
use log::trace;
use xcc_common::ScalarType;

/// Condition code for `left relation right` after `cmp right, left`.
fn condition(relation: Relation) -> Cond {
    match relation {
        Relation::Eq => Cond::E,
        Relation::Ne => Cond::Ne,
        Relation::Lt => Cond::L,
        Relation::Le => Cond::Le,
        Relation::Gt => Cond::G,
        Relation::Ge => Cond::Ge,
    }
}

/// Condition code for a float relation after `ucomisd`. Floats report
/// through the unsigned flags, and an unordered result (a NaN operand)
/// sets ZF, PF and CF together: only the above family is false for it,
/// so `<` and `<=` are compared with swapped operands, and `==`/`!=`
/// consult the parity flag as well.
fn float_condition(relation: Relation) -> Cond {
    match relation {
        Relation::Eq => Cond::E,
        Relation::Ne => Cond::Ne,
        Relation::Lt => Cond::B,
        Relation::Le => Cond::Be,
        Relation::Gt => Cond::A,
        Relation::Ge => Cond::Ae,
    }
}

/// Byte register free to hold a parity flag between two `setcc`s
const PARITY_SCRATCH: &str = "%al";

/// Assembler-local label skipping an unordered `==` branch
const ORDERED: &str = "1";

impl X86_64Code<'_> {
    pub(super) fn gen_binary(&mut self, op: ArithOp, left: Reg, right: Reg) -> Result<Reg, CodegenError> {
        self.same_class(op.name(), left, right)?;
        trace!("{} {:?} {:?}", op.name(), left, right);

        if left.class == TypeClass::Float {
            let sse = match op {
                ArithOp::Add => Sse::Addsd,
                ArithOp::Sub => Sse::Subsd,
                ArithOp::Mul => Sse::Mulsd,
                ArithOp::Div => Sse::Divsd,
                other => {
                    return Err(CodegenError::UnsupportedOperation(format!(
                        "{} on float operands",
                        other.name()
                    )))
                }
            };
            self.emit(AsmInst::Sse(sse, self.op(right)?, self.op(left)?));
            self.registers.free(right)?;
            return Ok(left);
        }

        let l = self.quad(left)?;
        let r = self.quad(right)?;
        let alu = |a| AsmInst::Alu(a, Width::Quad, r.clone(), l.clone());
        match op {
            ArithOp::Add => self.emit(alu(Alu::Add)),
            ArithOp::Sub => self.emit(alu(Alu::Sub)),
            ArithOp::Mul => self.emit(alu(Alu::Imul)),
            ArithOp::BitAnd => self.emit(alu(Alu::And)),
            ArithOp::BitOr => self.emit(alu(Alu::Or)),
            ArithOp::BitXor => self.emit(alu(Alu::Xor)),
            ArithOp::Div | ArithOp::Mod => {
                let result = if op == ArithOp::Div {
                    CallingConvention::DIVIDEND
                } else {
                    CallingConvention::REMAINDER
                };
                // %rax/%rdx are outside the pool; nothing may run between these
                self.emit(AsmInst::Mov(Width::Quad, l.clone(), Operand::Reg(CallingConvention::DIVIDEND)));
                self.emit(AsmInst::Cqo);
                self.emit(AsmInst::Idiv(Width::Quad, r.clone()));
                self.emit(AsmInst::Mov(Width::Quad, Operand::Reg(result), l.clone()));
            }
            ArithOp::Shl | ArithOp::Shr => {
                self.emit(AsmInst::Mov(Width::Quad, r.clone(), Operand::Reg(CallingConvention::SHIFT_COUNT)));
                let count = Operand::Reg(CallingConvention::SHIFT_COUNT_BYTE);
                if op == ArithOp::Shl {
                    self.emit(AsmInst::Shl(Width::Quad, count, l.clone()));
                } else {
                    self.emit(AsmInst::Sar(Width::Quad, count, l.clone()));
                }
            }
        }
        self.normalize(left)?;
        self.registers.free(right)?;
        Ok(left)
    }

    pub(super) fn gen_unary(&mut self, op: UnaryOp, reg: Reg) -> Result<Reg, CodegenError> {
        self.registers.check(reg)?;
        match (op, reg.class) {
            (UnaryOp::Negate, TypeClass::Float) => {
                let zero = self.allocate(TypeClass::Float)?;
                let z = self.op(zero)?;
                self.emit(AsmInst::Sse(Sse::Xorpd, z.clone(), z));
                self.emit(AsmInst::Sse(Sse::Subsd, self.op(reg)?, self.op(zero)?));
                self.registers.free(reg)?;
                Ok(zero)
            }
            (UnaryOp::Negate, _) => {
                self.emit(AsmInst::Neg(Width::Quad, self.quad(reg)?));
                self.normalize(reg)?;
                Ok(reg)
            }
            (UnaryOp::Invert, TypeClass::Float) => Err(CodegenError::unsupported_type("invert", "float")),
            (UnaryOp::Invert, _) => {
                self.emit(AsmInst::Not(Width::Quad, self.quad(reg)?));
                self.normalize(reg)?;
                Ok(reg)
            }
            (UnaryOp::Not, TypeClass::Float) => {
                self.float_zero_test(reg)?;
                let result = self.allocate(TypeClass::Long)?;
                self.float_set_into(result, Relation::Eq)?;
                Ok(result)
            }
            (UnaryOp::Not, _) => {
                let q = self.quad(reg)?;
                self.emit(AsmInst::Alu(Alu::Cmp, Width::Quad, Operand::Imm(0), q.clone()));
                self.emit(AsmInst::Set(Cond::E, self.byte(reg)?));
                self.emit(AsmInst::MovZx(Width::Byte, Width::Quad, self.byte(reg)?, q));
                reg.alias(TypeClass::Long)
            }
        }
    }

    /// Emit the flag-setting comparison of `left` against `right`.
    fn emit_compare(&mut self, left: Reg, right: Reg) -> Result<(), CodegenError> {
        self.emit(AsmInst::Alu(Alu::Cmp, Width::Quad, self.quad(right)?, self.quad(left)?));
        Ok(())
    }

    /// Emit `ucomisd` for `left relation right` and return the relation the
    /// flags now answer: `<` and `<=` become `>` and `>=` of the swapped pair.
    fn emit_float_compare(&mut self, relation: Relation, left: Reg, right: Reg) -> Result<Relation, CodegenError> {
        let (relation, left, right) = match relation {
            Relation::Lt => (Relation::Gt, right, left),
            Relation::Le => (Relation::Ge, right, left),
            other => (other, left, right),
        };
        self.emit(AsmInst::Sse(Sse::Ucomisd, self.op(right)?, self.op(left)?));
        Ok(relation)
    }

    /// Allocate a long register and materialize `cond` into it as 0 or 1.
    fn set_into_new(&mut self, cond: Cond) -> Result<Reg, CodegenError> {
        let result = self.allocate(TypeClass::Long)?;
        self.set_into(result, cond)?;
        Ok(result)
    }

    fn set_into(&mut self, reg: Reg, cond: Cond) -> Result<(), CodegenError> {
        self.emit(AsmInst::Set(cond, self.byte(reg)?));
        self.emit(AsmInst::MovZx(Width::Byte, Width::Quad, self.byte(reg)?, self.quad(reg)?));
        Ok(())
    }

    /// Materialize a float relation from the `ucomisd` flags as 0 or 1.
    fn float_set_into(&mut self, reg: Reg, relation: Relation) -> Result<(), CodegenError> {
        let byte = self.byte(reg)?;
        let scratch = Operand::Reg(PARITY_SCRATCH);
        self.emit(AsmInst::Set(float_condition(relation), byte.clone()));
        match relation {
            Relation::Eq => {
                self.emit(AsmInst::Set(Cond::Np, scratch.clone()));
                self.emit(AsmInst::Alu(Alu::And, Width::Byte, scratch, byte.clone()));
            }
            Relation::Ne => {
                self.emit(AsmInst::Set(Cond::P, scratch.clone()));
                self.emit(AsmInst::Alu(Alu::Or, Width::Byte, scratch, byte.clone()));
            }
            _ => {}
        }
        self.emit(AsmInst::MovZx(Width::Byte, Width::Quad, byte, self.quad(reg)?));
        Ok(())
    }

    /// Branch to `label` when the `ucomisd` flags satisfy `relation`.
    fn float_jump(&mut self, relation: Relation, label: &str) {
        match relation {
            Relation::Eq => {
                self.emit(AsmInst::Jcc(Cond::P, format!("{ORDERED}f")));
                self.emit(AsmInst::Jcc(Cond::E, label.to_string()));
                self.emit(AsmInst::Label(ORDERED.to_string()));
            }
            Relation::Ne => {
                self.emit(AsmInst::Jcc(Cond::Ne, label.to_string()));
                self.emit(AsmInst::Jcc(Cond::P, label.to_string()));
            }
            other => self.emit(AsmInst::Jcc(float_condition(other), label.to_string())),
        }
    }

    pub(super) fn gen_compare(&mut self, relation: Relation, left: Reg, right: Reg) -> Result<Reg, CodegenError> {
        self.same_class("compare", left, right)?;
        if left.class == TypeClass::Float {
            let relation = self.emit_float_compare(relation, left, right)?;
            self.registers.free(left)?;
            self.registers.free(right)?;
            let result = self.allocate(TypeClass::Long)?;
            self.float_set_into(result, relation)?;
            return Ok(result);
        }

        let cond = condition(relation);
        self.emit_compare(left, right)?;
        if left.class == TypeClass::Long {
            // long operands reuse the right operand's storage
            self.set_into(right, cond)?;
            self.registers.free(left)?;
            Ok(right)
        } else {
            let result = self.set_into_new(cond)?;
            self.registers.free(left)?;
            self.registers.free(right)?;
            Ok(result)
        }
    }

    pub(super) fn gen_compare_and_jump(
        &mut self,
        relation: Relation,
        left: Reg,
        right: Reg,
        label: &str,
    ) -> Result<(), CodegenError> {
        self.same_class("compare-and-jump", left, right)?;
        if left.class == TypeClass::Float {
            let relation = self.emit_float_compare(relation, left, right)?;
            self.float_jump(relation, label);
        } else {
            self.emit_compare(left, right)?;
            self.emit(AsmInst::Jcc(condition(relation), label.to_string()));
        }
        self.registers.free(left)?;
        self.registers.free(right)
    }

    /// Compare a float register against 0.0, consuming it.
    fn float_zero_test(&mut self, reg: Reg) -> Result<(), CodegenError> {
        let zero = self.allocate(TypeClass::Float)?;
        let z = self.op(zero)?;
        self.emit(AsmInst::Sse(Sse::Xorpd, z.clone(), z.clone()));
        self.emit(AsmInst::Sse(Sse::Ucomisd, z, self.op(reg)?));
        self.registers.free(zero)?;
        self.registers.free(reg)
    }

    pub(super) fn gen_zero_test_jump(&mut self, reg: Reg, label: &str, when_zero: bool) -> Result<(), CodegenError> {
        self.registers.check(reg)?;
        let relation = if when_zero { Relation::Eq } else { Relation::Ne };
        if reg.class == TypeClass::Float {
            // NaN is not zero
            self.float_zero_test(reg)?;
            self.float_jump(relation, label);
        } else {
            let q = self.quad(reg)?;
            self.emit(AsmInst::Alu(Alu::Test, Width::Quad, q.clone(), q));
            self.registers.free(reg)?;
            self.emit(AsmInst::Jcc(condition(relation), label.to_string()));
        }
        Ok(())
    }

    pub(super) fn gen_convert(&mut self, reg: Reg, from: ScalarType, to: ScalarType) -> Result<Reg, CodegenError> {
        let from_class = TypeClass::of(&from.into())?;
        let to_class = TypeClass::of(&to.into())?;
        self.expect_class("convert", reg, from_class)?;
        trace!("convert {from} -> {to}");
        if from == to {
            return Ok(reg);
        }
        match (from, to) {
            (ScalarType::Float, _) => {
                let result = self.allocate(to_class)?;
                self.emit(AsmInst::Cvttsd2si(Width::Quad, self.op(reg)?, self.quad(result)?));
                self.normalize(result)?;
                self.registers.free(reg)?;
                Ok(result)
            }
            (_, ScalarType::Float) => {
                let result = self.allocate(TypeClass::Float)?;
                self.emit(AsmInst::Cvtsi2sd(Width::Quad, self.quad(reg)?, self.op(result)?));
                self.registers.free(reg)?;
                Ok(result)
            }
            // narrowing re-extends from the narrower width
            (_, ScalarType::Char) | (ScalarType::Long, ScalarType::Int) => {
                let result = reg.alias(to_class)?;
                self.normalize(result)?;
                Ok(result)
            }
            // widening: the register already holds the extended value
            _ => reg.alias(to_class),
        }
    }
}
