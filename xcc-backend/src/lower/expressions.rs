//! Expression lowering

use super::{arithmetic, relation, unary, Lowering};
use log::trace;
use xcc_codegen::{AssemblyCode, CodegenError, Reg, Step, UnaryOp};
use xcc_common::{LabelGenerator, PrimitiveType, Value};
use xcc_frontend::{BinaryOp, LValue, TypedExpr};

impl<C: AssemblyCode> Lowering<'_, C> {
    /// Evaluate `expr` into a fresh register owned by the caller.
    pub(super) fn lower_expr(&mut self, expr: &TypedExpr) -> Result<Reg, CodegenError> {
        match expr {
            TypedExpr::Literal(value) => self.code.load_immediate(value),
            TypedExpr::Load(LValue::Variable(symbol)) => self.code.load_symbol(symbol),
            TypedExpr::Load(LValue::Dereference { address, pointer }) => {
                let address = self.lower_expr(address)?;
                self.code.dereference(address, *pointer)
            }
            TypedExpr::AddressOf { target, .. } => self.code.address_of(target),
            TypedExpr::Unary { op, operand, .. } => {
                let op = unary(*op)?;
                let reg = self.lower_expr(operand)?;
                self.code.unary(op, reg)
            }
            TypedExpr::Binary { op, left, right, .. } => {
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                if op.is_relational() {
                    self.code.compare(relation(*op)?, left, right)
                } else {
                    self.code.binary(arithmetic(*op)?, left, right)
                }
            }
            TypedExpr::Logical { op, left, right } => self.lower_logical(*op, left, right),
            TypedExpr::Assign { target, value } => self.lower_assign(target, value),
            TypedExpr::IncDec {
                target,
                increment,
                postfix,
            } => {
                let step = if *increment { Step::Increment } else { Step::Decrement };
                self.code.step(target, step, *postfix)
            }
            TypedExpr::Call { name, arguments, ty } => self
                .lower_call(name, arguments, *ty)?
                .ok_or_else(|| CodegenError::InvalidUsage(format!("void result of '{name}' used as a value"))),
            TypedExpr::Convert { operand, from, to } => {
                let reg = self.lower_expr(operand)?;
                self.code.convert(reg, *from, *to)
            }
            TypedExpr::PointerOffset {
                pointer,
                offset,
                element,
                subtract,
            } => {
                let base = self.lower_expr(pointer)?;
                let mut index = self.lower_expr(offset)?;
                if *subtract {
                    index = self.code.unary(UnaryOp::Negate, index)?;
                }
                self.code.element_address(base, index, *element)
            }
        }
    }

    /// Evaluate for side effects only, releasing any result.
    pub(super) fn discard(&mut self, expr: &TypedExpr) -> Result<(), CodegenError> {
        match expr {
            TypedExpr::Call { name, arguments, ty } => match self.lower_call(name, arguments, *ty)? {
                Some(result) => self.code.free(result),
                None => Ok(()),
            },
            _ => {
                let reg = self.lower_expr(expr)?;
                self.code.free(reg)
            }
        }
    }

    /// An assignment yields the stored value.
    fn lower_assign(&mut self, target: &LValue, value: &TypedExpr) -> Result<Reg, CodegenError> {
        let reg = self.lower_expr(value)?;
        match target {
            LValue::Variable(symbol) => self.code.store_symbol(reg, symbol)?,
            LValue::Dereference { address, pointer } => {
                let address = self.lower_expr(address)?;
                self.code.store_indirect(reg, address, *pointer)?;
            }
        }
        Ok(reg)
    }

    /// Short-circuit `&&`/`||` producing 0 or 1 as a long.
    fn lower_logical(&mut self, op: BinaryOp, left: &TypedExpr, right: &TypedExpr) -> Result<Reg, CodegenError> {
        let (kind, short_circuit) = match op {
            BinaryOp::LogicalAnd => ("and", 0),
            BinaryOp::LogicalOr => ("or", 1),
            other => return Err(CodegenError::UnsupportedOperation(format!("'{other}' is not logical"))),
        };
        let id = self.labels.next_id(kind);
        let short = LabelGenerator::label(kind, id, "short");
        let end = LabelGenerator::label(kind, id, "end");
        trace!("logical {op} -> {short}");

        for operand in [left, right] {
            let reg = self.lower_expr(operand)?;
            if short_circuit == 0 {
                self.code.jump_if_zero(reg, &short)?;
            } else {
                self.code.jump_if_not_zero(reg, &short)?;
            }
        }
        let result = self.code.load_immediate(&Value::Long(1 - short_circuit))?;
        self.code.jump(&end);
        self.code.label(&short);
        self.code.move_immediate(result, short_circuit)?;
        self.code.label(&end);
        Ok(result)
    }

    /// Calls pass a single argument directly and push longer lists.
    pub(super) fn lower_call(
        &mut self,
        name: &str,
        arguments: &[TypedExpr],
        return_type: PrimitiveType,
    ) -> Result<Option<Reg>, CodegenError> {
        match arguments {
            [] => self.code.call_function(name, None, return_type),
            [argument] => {
                let reg = self.lower_expr(argument)?;
                self.code.call_function(name, Some(reg), return_type)
            }
            _ => {
                let mut classes = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    let reg = self.lower_expr(argument)?;
                    classes.push(reg.class);
                    self.code.push_argument(reg)?;
                }
                self.code.call_with_arguments(name, &classes, return_type)
            }
        }
    }
}
