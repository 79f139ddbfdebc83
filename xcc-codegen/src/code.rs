//! The emitter contract
//!
//! [`AssemblyCode`] is what the lowering walker drives: one operation per
//! instruction pattern, each taking operand registers, emitting text and
//! returning the register that holds the result. Operations document which
//! operand registers they consume (free). A register returned to the caller
//! is owned by the caller until it is freed or consumed.

use crate::error::CodegenError;
use crate::regalloc::{Reg, TypeClass};
use xcc_common::{FunctionInfo, Initializer, PrimitiveType, ScalarType, Symbol, Value};

/// Binary operators with a register result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl ArithOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "subtract",
            ArithOp::Mul => "multiply",
            ArithOp::Div => "divide",
            ArithOp::Mod => "modulo",
            ArithOp::BitAnd => "and",
            ArithOp::BitOr => "or",
            ArithOp::BitXor => "xor",
            ArithOp::Shl => "shift-left",
            ArithOp::Shr => "shift-right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    /// Bitwise complement
    Invert,
    /// Logical not, yields 0 or 1
    Not,
}

/// Comparison relations, independent of operand signedness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Relation {
    pub fn negate(self) -> Relation {
        match self {
            Relation::Eq => Relation::Ne,
            Relation::Ne => Relation::Eq,
            Relation::Lt => Relation::Ge,
            Relation::Ge => Relation::Lt,
            Relation::Le => Relation::Gt,
            Relation::Gt => Relation::Le,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Increment,
    Decrement,
}

/// Label every `return` in `function` jumps to
pub fn return_label(function: &str) -> String {
    format!(".L{function}_return")
}

pub trait AssemblyCode {
    /// Reset the register file and emit the constant pools.
    fn preamble(&mut self) -> Result<(), CodegenError>;

    /// Data-section storage for a global, zero-filled past the initializer.
    fn declare_global(&mut self, symbol: &Symbol, init: Option<&Initializer>) -> Result<(), CodegenError>;

    /// Close the program. Fails if registers are still live.
    fn postamble(&mut self) -> Result<(), CodegenError>;

    /// The assembled program text
    fn output(&self) -> String;

    /// Allocations minus frees over the whole run
    fn net_allocations(&self) -> isize;

    fn live_registers(&self) -> usize;

    /// Registers still live when `scope` ends fail generation when strict.
    /// When lenient they are logged and freed.
    fn reclaim_registers(&mut self, scope: &str) -> Result<(), CodegenError>;

    /// Release a register the caller owns.
    fn free(&mut self, reg: Reg) -> Result<(), CodegenError>;

    fn load_immediate(&mut self, value: &Value) -> Result<Reg, CodegenError>;

    /// Overwrite an owned integer register with a constant.
    fn move_immediate(&mut self, reg: Reg, value: i64) -> Result<(), CodegenError>;

    fn load_symbol(&mut self, symbol: &Symbol) -> Result<Reg, CodegenError>;

    /// Store `reg` into the symbol's storage. `reg` stays live.
    fn store_symbol(&mut self, reg: Reg, symbol: &Symbol) -> Result<(), CodegenError>;

    /// Store `reg` into element `index` of an array symbol. `reg` stays live.
    fn store_element(&mut self, reg: Reg, symbol: &Symbol, index: usize) -> Result<(), CodegenError>;

    fn address_of(&mut self, symbol: &Symbol) -> Result<Reg, CodegenError>;

    /// Load through the address in `reg`, consuming it.
    fn dereference(&mut self, reg: Reg, pointer: PrimitiveType) -> Result<Reg, CodegenError>;

    /// Store `value` through `address`. Consumes `address`; `value` stays live.
    fn store_indirect(&mut self, value: Reg, address: Reg, pointer: PrimitiveType) -> Result<(), CodegenError>;

    /// `base + index * sizeof(element)`, consuming `index`.
    fn element_address(&mut self, base: Reg, index: Reg, element: ScalarType) -> Result<Reg, CodegenError>;

    /// `++x`/`--x`/`x++`/`x--` on a variable, returning the expression value.
    fn step(&mut self, symbol: &Symbol, step: Step, postfix: bool) -> Result<Reg, CodegenError>;

    /// Consumes `right`; the result is in `left`'s storage.
    fn binary(&mut self, op: ArithOp, left: Reg, right: Reg) -> Result<Reg, CodegenError>;

    fn unary(&mut self, op: UnaryOp, reg: Reg) -> Result<Reg, CodegenError>;

    /// Materialize 0 or 1, consuming both operands.
    fn compare(&mut self, relation: Relation, left: Reg, right: Reg) -> Result<Reg, CodegenError>;

    /// Jump to `label` when `left relation right` holds. Consumes both operands.
    fn compare_and_jump(&mut self, relation: Relation, left: Reg, right: Reg, label: &str) -> Result<(), CodegenError>;

    /// Consumes `reg`.
    fn jump_if_zero(&mut self, reg: Reg, label: &str) -> Result<(), CodegenError>;

    /// Consumes `reg`.
    fn jump_if_not_zero(&mut self, reg: Reg, label: &str) -> Result<(), CodegenError>;

    fn jump(&mut self, label: &str);

    fn label(&mut self, label: &str);

    /// Consumes `reg` and returns the converted value.
    fn convert(&mut self, reg: Reg, from: ScalarType, to: ScalarType) -> Result<Reg, CodegenError>;

    fn function_prologue(&mut self, function: &FunctionInfo, parameters: &[Symbol]) -> Result<(), CodegenError>;

    /// Emit the shared return label and tear the frame down.
    fn function_epilogue(&mut self, function: &FunctionInfo) -> Result<(), CodegenError>;

    /// Move a value into the return register, consuming it.
    fn return_value(&mut self, reg: Reg, return_type: PrimitiveType) -> Result<(), CodegenError>;

    /// Call with at most one argument passed directly; consumes `argument`.
    fn call_function(
        &mut self,
        name: &str,
        argument: Option<Reg>,
        return_type: PrimitiveType,
    ) -> Result<Option<Reg>, CodegenError>;

    /// Push one argument of a multi-argument call, consuming it.
    fn push_argument(&mut self, reg: Reg) -> Result<(), CodegenError>;

    /// Call with every argument already pushed, in order.
    fn call_with_arguments(
        &mut self,
        name: &str,
        arguments: &[TypeClass],
        return_type: PrimitiveType,
    ) -> Result<Option<Reg>, CodegenError>;

    /// Call an array print routine with the array address and its length.
    fn print_array(&mut self, address: Reg, routine: &str, length: usize) -> Result<(), CodegenError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_negation() {
        for r in [Relation::Eq, Relation::Ne, Relation::Lt, Relation::Le, Relation::Gt, Relation::Ge] {
            assert_eq!(r.negate().negate(), r);
        }
        assert_eq!(Relation::Lt.negate(), Relation::Ge);
    }

    #[test]
    fn test_return_label() {
        assert_eq!(return_label("main"), ".Lmain_return");
    }
}
