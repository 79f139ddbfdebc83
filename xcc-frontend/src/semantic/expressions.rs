//! Expression checking and implicit conversions

use crate::ast::*;
use crate::semantic::errors::SemanticError;
use crate::semantic::symbols::resolve_type;
use crate::semantic::SemanticAnalyzer;
use crate::typed_ast::{LValue, TypedExpr};
use xcc_common::{PrimitiveType, ScalarType, SourceSpan, Symbol, Value};

/// Convert `expr` from `from` to `to`. Integer-valued literals are folded;
/// conversions to float stay explicit so no new float constant is needed.
pub(crate) fn convert(expr: TypedExpr, from: ScalarType, to: ScalarType) -> TypedExpr {
    if from == to {
        return expr;
    }
    if to.is_integer() {
        if let TypedExpr::Literal(value) = &expr {
            if let Some(folded) = value.convert(to) {
                return TypedExpr::Literal(folded);
            }
        }
    }
    TypedExpr::Convert {
        operand: Box::new(expr),
        from,
        to,
    }
}

fn is_null_constant(expr: &TypedExpr) -> bool {
    matches!(expr, TypedExpr::Literal(value) if value.as_i64() == Some(0))
}

/// Convert `expr` to the type of the storage it is written to.
pub(crate) fn coerce(expr: TypedExpr, target: PrimitiveType, span: &SourceSpan) -> Result<TypedExpr, SemanticError> {
    let from = expr.value_type();
    if from == target {
        return Ok(expr);
    }
    match (from, target) {
        (PrimitiveType::Scalar(from), PrimitiveType::Scalar(to)) => Ok(convert(expr, from, to)),
        (_, PrimitiveType::Pointer(_)) if is_null_constant(&expr) => Ok(TypedExpr::Literal(Value::Long(0))),
        _ => Err(SemanticError::TypeMismatch {
            expected: target,
            found: expr.ty(),
            span: span.clone(),
        }),
    }
}

fn pointer_offset(pointer: TypedExpr, offset: TypedExpr, offset_type: ScalarType, element: ScalarType, subtract: bool) -> TypedExpr {
    TypedExpr::PointerOffset {
        pointer: Box::new(pointer),
        offset: Box::new(convert(offset, offset_type, ScalarType::Long)),
        element,
        subtract,
    }
}

fn binary_node(op: BinaryOp, left: TypedExpr, right: TypedExpr, ty: PrimitiveType) -> TypedExpr {
    TypedExpr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        ty,
    }
}

impl SemanticAnalyzer {
    /// Analyze an expression whose value may be void, as in a statement-level call.
    pub(crate) fn analyze_expression(&mut self, expr: &Expression) -> Result<TypedExpr, SemanticError> {
        let span = &expr.span;
        match &expr.kind {
            ExpressionKind::Literal(value) => Ok(TypedExpr::Literal(value.clone())),
            ExpressionKind::Identifier(name) => Ok(TypedExpr::Load(LValue::Variable(self.variable(name, span)?))),
            ExpressionKind::Binary { op, left, right } => {
                let left = self.analyze_value(left)?;
                let right = self.analyze_value(right)?;
                self.binary(*op, left, right, span)
            }
            ExpressionKind::Unary { op, operand } => self.unary(*op, operand, span),
            ExpressionKind::Assignment { op, target, value } => self.assignment(*op, target, value, span),
            ExpressionKind::Call { function, arguments } => self.call(function, arguments, span),
            ExpressionKind::Index { .. } => Ok(TypedExpr::Load(self.lvalue(expr)?)),
            ExpressionKind::Cast { target_type, operand } => {
                let target = resolve_type(target_type, span)?;
                let value = self.analyze_value(operand)?;
                match (value.value_type(), target) {
                    (PrimitiveType::Scalar(from), PrimitiveType::Scalar(to)) => Ok(convert(value, from, to)),
                    (from, to) if from == to => Ok(value),
                    (from, to) => Err(SemanticError::unsupported(format!("cast from {from} to {to}"), span)),
                }
            }
        }
    }

    /// Analyze an expression used for its value.
    pub(crate) fn analyze_value(&mut self, expr: &Expression) -> Result<TypedExpr, SemanticError> {
        let typed = self.analyze_expression(expr)?;
        if typed.ty().is_void() {
            return Err(SemanticError::VoidValue { span: expr.span.clone() });
        }
        Ok(typed)
    }

    fn variable(&self, name: &str, span: &SourceSpan) -> Result<Symbol, SemanticError> {
        self.symbols.lookup(name).cloned().ok_or_else(|| SemanticError::UndefinedVariable {
            name: name.to_string(),
            span: span.clone(),
        })
    }

    pub(crate) fn binary(
        &mut self,
        op: BinaryOp,
        left: TypedExpr,
        right: TypedExpr,
        span: &SourceSpan,
    ) -> Result<TypedExpr, SemanticError> {
        use PrimitiveType::{Pointer, Scalar};

        if op.is_logical() {
            return Ok(TypedExpr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        let (left_type, right_type) = (left.value_type(), right.value_type());
        let relational = op.is_relational();
        match (left_type, right_type) {
            (Scalar(a), Scalar(b)) => {
                let common = a.common(b);
                if common == ScalarType::Float && op.is_integer_only() {
                    return Err(SemanticError::invalid_operation(op, PrimitiveType::FLOAT, span));
                }
                let ty = if relational { PrimitiveType::LONG } else { Scalar(common) };
                Ok(binary_node(op, convert(left, a, common), convert(right, b, common), ty))
            }
            (Pointer(element), Scalar(s)) if s.is_integer() && matches!(op, BinaryOp::Add | BinaryOp::Sub) => {
                Ok(pointer_offset(left, right, s, element, op == BinaryOp::Sub))
            }
            (Scalar(s), Pointer(element)) if s.is_integer() && op == BinaryOp::Add => {
                Ok(pointer_offset(right, left, s, element, false))
            }
            (Pointer(a), Pointer(b)) if a == b && op == BinaryOp::Sub => {
                // distance in elements
                let bytes = binary_node(BinaryOp::Sub, left, right, PrimitiveType::LONG);
                let size = TypedExpr::Literal(Value::Long(a.size() as i64));
                Ok(binary_node(BinaryOp::Div, bytes, size, PrimitiveType::LONG))
            }
            (Pointer(a), Pointer(b)) if a == b && relational => Ok(binary_node(op, left, right, PrimitiveType::LONG)),
            (Pointer(_), Scalar(_)) if relational && is_null_constant(&right) => Ok(binary_node(
                op,
                left,
                TypedExpr::Literal(Value::Long(0)),
                PrimitiveType::LONG,
            )),
            (Scalar(_), Pointer(_)) if relational && is_null_constant(&left) => Ok(binary_node(
                op,
                TypedExpr::Literal(Value::Long(0)),
                right,
                PrimitiveType::LONG,
            )),
            (Pointer(_), _) => Err(SemanticError::invalid_operation(op, left.ty(), span)),
            _ => Err(SemanticError::invalid_operation(op, right.ty(), span)),
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expression, span: &SourceSpan) -> Result<TypedExpr, SemanticError> {
        match op {
            UnaryOp::Plus | UnaryOp::Minus | UnaryOp::BitNot => {
                let value = self.analyze_value(operand)?;
                let PrimitiveType::Scalar(s) = value.value_type() else {
                    return Err(SemanticError::invalid_operation(op, value.ty(), span));
                };
                if op == UnaryOp::BitNot && s == ScalarType::Float {
                    return Err(SemanticError::invalid_operation(op, PrimitiveType::FLOAT, span));
                }
                let promoted = s.common(ScalarType::Int);
                let value = convert(value, s, promoted);
                if op == UnaryOp::Plus {
                    return Ok(value);
                }
                // negative integer constants stay literals
                if let (UnaryOp::Minus, TypedExpr::Literal(literal)) = (op, &value) {
                    if promoted.is_integer() {
                        if let Some(negated) = literal.negate() {
                            return Ok(TypedExpr::Literal(negated));
                        }
                    }
                }
                Ok(TypedExpr::Unary {
                    op,
                    operand: Box::new(value),
                    ty: PrimitiveType::Scalar(promoted),
                })
            }
            UnaryOp::LogicalNot => Ok(TypedExpr::Unary {
                op,
                operand: Box::new(self.analyze_value(operand)?),
                ty: PrimitiveType::LONG,
            }),
            UnaryOp::Dereference => {
                let (address, pointer) = self.pointer_operand(operand, span)?;
                Ok(TypedExpr::Load(LValue::Dereference {
                    address: Box::new(address),
                    pointer,
                }))
            }
            UnaryOp::AddressOf => self.address_of(operand, span),
            UnaryOp::PreIncrement => self.step(operand, true, false, span),
            UnaryOp::PostIncrement => self.step(operand, true, true, span),
            UnaryOp::PreDecrement => self.step(operand, false, false, span),
            UnaryOp::PostDecrement => self.step(operand, false, true, span),
        }
    }

    /// The address in a pointer-valued operand, with its pointer type
    fn pointer_operand(&mut self, operand: &Expression, span: &SourceSpan) -> Result<(TypedExpr, PrimitiveType), SemanticError> {
        let address = self.analyze_value(operand)?;
        let pointer = address.value_type();
        if !pointer.is_pointer() {
            return Err(SemanticError::invalid_operation("dereference", address.ty(), span));
        }
        Ok((address, pointer))
    }

    /// Address of `array[index]`, with its pointer type
    fn element_address(
        &mut self,
        array: &Expression,
        index: &Expression,
        span: &SourceSpan,
    ) -> Result<(TypedExpr, PrimitiveType), SemanticError> {
        let base = self.analyze_value(array)?;
        let index = self.analyze_value(index)?;
        let PrimitiveType::Pointer(element) = base.value_type() else {
            return Err(SemanticError::invalid_operation("subscript", base.ty(), span));
        };
        match index.value_type() {
            PrimitiveType::Scalar(s) if s.is_integer() => {
                Ok((pointer_offset(base, index, s, element, false), PrimitiveType::Pointer(element)))
            }
            other => Err(SemanticError::invalid_operation("array index", other, span)),
        }
    }

    pub(crate) fn lvalue(&mut self, expr: &Expression) -> Result<LValue, SemanticError> {
        let span = &expr.span;
        match &expr.kind {
            ExpressionKind::Identifier(name) => {
                let symbol = self.variable(name, span)?;
                if symbol.ty.is_array() {
                    return Err(SemanticError::InvalidLvalue { span: span.clone() });
                }
                Ok(LValue::Variable(symbol))
            }
            ExpressionKind::Unary {
                op: UnaryOp::Dereference,
                operand,
            } => {
                let (address, pointer) = self.pointer_operand(operand, span)?;
                Ok(LValue::Dereference {
                    address: Box::new(address),
                    pointer,
                })
            }
            ExpressionKind::Index { array, index } => {
                let (address, pointer) = self.element_address(array, index, span)?;
                Ok(LValue::Dereference {
                    address: Box::new(address),
                    pointer,
                })
            }
            _ => Err(SemanticError::InvalidLvalue { span: span.clone() }),
        }
    }

    fn address_of(&mut self, operand: &Expression, span: &SourceSpan) -> Result<TypedExpr, SemanticError> {
        match &operand.kind {
            ExpressionKind::Identifier(name) => {
                let target = self.variable(name, span)?;
                let ty = match target.ty {
                    PrimitiveType::Scalar(s) | PrimitiveType::Array { element: s, .. } => PrimitiveType::Pointer(s),
                    other => return Err(SemanticError::unsupported(format!("address of {other} '{name}'"), span)),
                };
                Ok(TypedExpr::AddressOf { target, ty })
            }
            // &*p is p, &a[i] is the element address
            ExpressionKind::Unary {
                op: UnaryOp::Dereference,
                operand: inner,
            } => Ok(self.pointer_operand(inner, span)?.0),
            ExpressionKind::Index { array, index } => Ok(self.element_address(array, index, span)?.0),
            _ => Err(SemanticError::InvalidLvalue { span: span.clone() }),
        }
    }

    fn step(&mut self, operand: &Expression, increment: bool, postfix: bool, span: &SourceSpan) -> Result<TypedExpr, SemanticError> {
        let ExpressionKind::Identifier(name) = &operand.kind else {
            return Err(SemanticError::unsupported("increment or decrement of a non-variable", span));
        };
        let target = self.variable(name, span)?;
        match target.ty {
            PrimitiveType::Scalar(s) if s.is_integer() => {}
            PrimitiveType::Pointer(_) => {}
            other => {
                let operation = if increment { "++" } else { "--" };
                return Err(SemanticError::invalid_operation(operation, other, span));
            }
        }
        Ok(TypedExpr::IncDec {
            target,
            increment,
            postfix,
        })
    }

    fn assignment(
        &mut self,
        op: AssignOp,
        target: &Expression,
        value: &Expression,
        span: &SourceSpan,
    ) -> Result<TypedExpr, SemanticError> {
        let target = self.lvalue(target)?;
        let value = match op {
            AssignOp::Assign => self.analyze_value(value)?,
            // x op= y is x = x op y
            AssignOp::Compound(binary_op) => {
                let LValue::Variable(symbol) = &target else {
                    return Err(SemanticError::unsupported(format!("'{op}' through a pointer"), span));
                };
                let current = TypedExpr::Load(LValue::Variable(symbol.clone()));
                let rhs = self.analyze_value(value)?;
                self.binary(binary_op, current, rhs, span)?
            }
        };
        let value = coerce(value, target.ty(), span)?;
        Ok(TypedExpr::Assign {
            target,
            value: Box::new(value),
        })
    }

    fn call(&mut self, name: &str, arguments: &[Expression], span: &SourceSpan) -> Result<TypedExpr, SemanticError> {
        let signature = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| SemanticError::UndefinedFunction {
                name: name.to_string(),
                span: span.clone(),
            })?;
        if arguments.len() != signature.parameters.len() {
            return Err(SemanticError::ArgumentCountMismatch {
                name: name.to_string(),
                expected: signature.parameters.len(),
                found: arguments.len(),
                span: span.clone(),
            });
        }
        let arguments = arguments
            .iter()
            .zip(&signature.parameters)
            .map(|(argument, ty)| {
                let value = self.analyze_value(argument)?;
                coerce(value, *ty, &argument.span)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypedExpr::Call {
            name: name.to_string(),
            arguments,
            ty: signature.return_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, UnaryOp};
    use crate::semantic::tests::{analyze_body, semantic_message};
    use crate::typed_ast::{LValue, TypedExpr, TypedStmt};
    use pretty_assertions::assert_eq;
    use xcc_common::{PrimitiveType, ScalarType, Value};

    /// The typed expression of the last statement of `body`
    fn last_expr(body: &str) -> TypedExpr {
        let stmts = analyze_body(body).unwrap();
        match stmts.into_iter().last() {
            Some(TypedStmt::Expression { expr, .. }) => expr,
            Some(TypedStmt::Print { value, .. }) => value,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_usual_arithmetic_conversions() {
        let expr = last_expr("int i; float f; print i + f;");
        assert_eq!(expr.ty(), PrimitiveType::FLOAT);
        let TypedExpr::Binary { left, .. } = expr else {
            panic!("expected a binary expression");
        };
        assert!(matches!(
            *left,
            TypedExpr::Convert {
                from: ScalarType::Int,
                to: ScalarType::Float,
                ..
            }
        ));
    }

    #[test]
    fn test_char_operands_promote_to_int() {
        let expr = last_expr("char a; char b; print a * b;");
        assert_eq!(expr.ty(), PrimitiveType::INT);
    }

    #[test]
    fn test_integer_literals_are_folded_not_converted() {
        let expr = last_expr("long x; print x + 1;");
        let TypedExpr::Binary { right, .. } = expr else {
            panic!("expected a binary expression");
        };
        assert_eq!(*right, TypedExpr::Literal(Value::Long(1)));
        assert_eq!(last_expr("print -5;"), TypedExpr::Literal(Value::Int(-5)));
    }

    #[test]
    fn test_comparisons_and_logic_are_long() {
        assert_eq!(last_expr("int a; print a < 2;").ty(), PrimitiveType::LONG);
        assert_eq!(last_expr("float a; print a && 1;").ty(), PrimitiveType::LONG);
        assert_eq!(last_expr("int a; print !a;").ty(), PrimitiveType::LONG);
    }

    #[test]
    fn test_pointer_arithmetic_is_scaled_offset() {
        let expr = last_expr("long a[4]; long *p; p = a + 2;");
        let TypedExpr::Assign { value, .. } = expr else {
            panic!("expected an assignment");
        };
        assert!(matches!(
            *value,
            TypedExpr::PointerOffset {
                element: ScalarType::Long,
                subtract: false,
                ..
            }
        ));
    }

    #[test]
    fn test_pointer_difference_counts_elements() {
        let expr = last_expr("int a[4]; int *p; int *q; p = a; q = a + 3; print q - p;");
        assert!(matches!(expr, TypedExpr::Binary { op: BinaryOp::Div, .. }));
        assert_eq!(expr.ty(), PrimitiveType::LONG);
    }

    #[test]
    fn test_index_is_dereferenced_offset() {
        let expr = last_expr("float v[3]; int i; print v[i];");
        let TypedExpr::Load(LValue::Dereference { address, pointer }) = expr else {
            panic!("expected a dereference");
        };
        assert_eq!(pointer, PrimitiveType::Pointer(ScalarType::Float));
        let TypedExpr::PointerOffset { offset, .. } = *address else {
            panic!("expected a pointer offset");
        };
        assert_eq!(offset.ty(), PrimitiveType::LONG);
    }

    #[test]
    fn test_address_of_and_store_through_pointer() {
        let expr = last_expr("int x; int *p; p = &x; *p = 3;");
        let TypedExpr::Assign { target, value } = expr else {
            panic!("expected an assignment");
        };
        assert!(matches!(target, LValue::Dereference { .. }));
        assert_eq!(*value, TypedExpr::Literal(Value::Int(3)));
    }

    #[test]
    fn test_compound_assignment_desugars() {
        let expr = last_expr("float f; f *= 2;");
        let TypedExpr::Assign { value, .. } = expr else {
            panic!("expected an assignment");
        };
        assert!(matches!(*value, TypedExpr::Binary { op: BinaryOp::Mul, ty: PrimitiveType::FLOAT, .. }));
    }

    #[test]
    fn test_assignment_converts_to_target() {
        let expr = last_expr("char c; float f; c = f;");
        let TypedExpr::Assign { value, .. } = expr else {
            panic!("expected an assignment");
        };
        assert_eq!(value.ty(), PrimitiveType::CHAR);
    }

    #[test]
    fn test_increment_targets() {
        assert!(matches!(
            last_expr("int *p; p++;"),
            TypedExpr::IncDec {
                increment: true,
                postfix: true,
                ..
            }
        ));
        let message = semantic_message(analyze_body("float f; ++f;"));
        assert!(message.contains("++"), "{message}");
    }

    #[test]
    fn test_unary_minus_on_float_variable() {
        let expr = last_expr("float f; print -f;");
        assert!(matches!(expr, TypedExpr::Unary { op: UnaryOp::Minus, ty: PrimitiveType::FLOAT, .. }));
    }

    #[test]
    fn test_float_bitwise_rejected() {
        let message = semantic_message(analyze_body("float f; print f % 2;"));
        assert_eq!(message, "Invalid operation % on type float");
        assert!(analyze_body("float f; print ~f;").is_err());
    }

    #[test]
    fn test_invalid_lvalues() {
        assert_eq!(semantic_message(analyze_body("int a; a + 1 = 2;")), "Invalid lvalue in assignment");
        assert_eq!(semantic_message(analyze_body("int a[2]; int b[2]; a = b;")), "Invalid lvalue in assignment");
    }

    #[test]
    fn test_undefined_names() {
        assert_eq!(semantic_message(analyze_body("print y;")), "Undefined variable: y");
        assert_eq!(semantic_message(analyze_body("print g(1);")), "Undefined function: g");
    }

    #[test]
    fn test_type_mismatch_on_pointer_assignment() {
        let message = semantic_message(analyze_body("int *p; float f; p = f;"));
        assert_eq!(message, "Type mismatch: expected int*, found float");
    }
}
