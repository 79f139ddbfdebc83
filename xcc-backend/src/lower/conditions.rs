//! Branch lowering for control-flow conditions
//!
//! A condition jumps to a false label when it does not hold and falls
//! through otherwise. Comparisons at the root become a single negated
//! compare-and-jump, and `&&`/`||` at the root branch directly without
//! materializing a 0/1 value. A float comparison with a NaN operand is
//! false under every relation, so its negation is not a comparison: float
//! conditions jump over the false branch when they hold instead.

use super::{relation, Lowering};
use xcc_codegen::{AssemblyCode, CodegenError};
use xcc_common::LabelGenerator;
use xcc_frontend::{BinaryOp, TypedExpr};

impl<C: AssemblyCode> Lowering<'_, C> {
    pub(super) fn lower_condition(&mut self, condition: &TypedExpr, false_label: &str) -> Result<(), CodegenError> {
        match condition {
            TypedExpr::Binary { op, left, right, .. } if op.is_relational() && left.ty().is_float() => {
                let id = self.labels.next_id("fcmp");
                let taken = LabelGenerator::label("fcmp", id, "true");
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                self.code.compare_and_jump(relation(*op)?, left, right, &taken)?;
                self.code.jump(false_label);
                self.code.label(&taken);
                Ok(())
            }
            TypedExpr::Binary { op, left, right, .. } if op.is_relational() => {
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                self.code.compare_and_jump(relation(*op)?.negate(), left, right, false_label)
            }
            TypedExpr::Logical {
                op: BinaryOp::LogicalAnd,
                left,
                right,
            } => {
                self.lower_condition(left, false_label)?;
                self.lower_condition(right, false_label)
            }
            TypedExpr::Logical {
                op: BinaryOp::LogicalOr,
                left,
                right,
            } => {
                let id = self.labels.next_id("or");
                let taken = LabelGenerator::label("or", id, "true");
                let reg = self.lower_expr(left)?;
                self.code.jump_if_not_zero(reg, &taken)?;
                self.lower_condition(right, false_label)?;
                self.code.label(&taken);
                Ok(())
            }
            // arithmetic and everything else: compare the value with zero
            _ => {
                let reg = self.lower_expr(condition)?;
                self.code.jump_if_zero(reg, false_label)
            }
        }
    }
}
