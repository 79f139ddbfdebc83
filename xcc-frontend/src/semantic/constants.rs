//! Compile-time evaluation of global initializers
//!
//! Globals live in the data section, so their initializers must fold to
//! constants: literals, optionally negated or cast, converted to the
//! declared type.

use crate::ast::{Expression, ExpressionKind, Initializer as AstInitializer, UnaryOp};
use crate::semantic::errors::SemanticError;
use crate::semantic::symbols::resolve_type;
use xcc_common::{Initializer, PrimitiveType, ScalarType, SourceSpan, Value};

/// Fold a constant expression, or `None` if it is not constant.
pub fn fold(expr: &Expression) -> Option<Value> {
    match &expr.kind {
        ExpressionKind::Literal(value) => Some(value.clone()),
        ExpressionKind::Unary {
            op: UnaryOp::Minus,
            operand,
        } => fold(operand)?.negate(),
        ExpressionKind::Unary { op: UnaryOp::Plus, operand } => fold(operand),
        ExpressionKind::Cast { target_type, operand } => {
            let target = resolve_type(target_type, &expr.span).ok()?.scalar()?;
            fold(operand)?.convert(target)
        }
        _ => None,
    }
}

/// Bytes of a string with its terminating NUL, as char values
pub fn string_chars(s: &str) -> impl Iterator<Item = Value> + '_ {
    s.bytes().chain(std::iter::once(0)).map(Value::Char)
}

fn non_constant(name: &str, span: &SourceSpan) -> SemanticError {
    SemanticError::NonConstantInitializer {
        name: name.to_string(),
        span: span.clone(),
    }
}

/// Fold `value` and convert it to the scalar or pointer type `ty`.
fn constant_of(name: &str, ty: &PrimitiveType, expr: &Expression) -> Result<Value, SemanticError> {
    let value = fold(expr).ok_or_else(|| non_constant(name, &expr.span))?;
    let mismatch = || SemanticError::TypeMismatch {
        expected: *ty,
        found: value.ty(),
        span: expr.span.clone(),
    };
    match (ty, &value) {
        (PrimitiveType::Pointer(ScalarType::Char), Value::Str(_)) => Ok(value.clone()),
        (PrimitiveType::Pointer(_), v) if v.as_i64() == Some(0) => Ok(Value::Long(0)),
        (PrimitiveType::Scalar(target), _) => value.convert(*target).ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

/// Flatten a (possibly nested) initializer list into its expressions.
fn flatten<'a>(init: &'a AstInitializer, out: &mut Vec<&'a Expression>) {
    match init {
        AstInitializer::Expression(expr) => out.push(expr),
        AstInitializer::List { items, .. } => {
            for item in items {
                flatten(item, out);
            }
        }
    }
}

/// Folded data-section initializer of the global `name` of type `ty`
pub fn global_initializer(name: &str, ty: &PrimitiveType, init: &AstInitializer) -> Result<Initializer, SemanticError> {
    let PrimitiveType::Array { element, length } = *ty else {
        return match init {
            AstInitializer::Expression(expr) => Ok(Initializer::Value(constant_of(name, ty, expr)?)),
            AstInitializer::List { span, .. } => Err(SemanticError::unsupported(
                format!("initializer list for non-array '{name}'"),
                span,
            )),
        };
    };

    let values: Vec<Value> = match init {
        AstInitializer::Expression(Expression {
            kind: ExpressionKind::Literal(Value::Str(s)),
            ..
        }) if element == ScalarType::Char => {
            // the terminator is dropped when the string fills the array exactly
            let mut chars: Vec<Value> = string_chars(s).collect();
            if chars.len() == length + 1 {
                chars.pop();
            }
            chars
        }
        AstInitializer::Expression(expr) => {
            return Err(SemanticError::TypeMismatch {
                expected: *ty,
                found: fold(expr).map_or(PrimitiveType::Void, |v| v.ty()),
                span: expr.span.clone(),
            })
        }
        AstInitializer::List { .. } => {
            let mut exprs = Vec::new();
            flatten(init, &mut exprs);
            exprs
                .into_iter()
                .map(|expr| constant_of(name, &PrimitiveType::Scalar(element), expr))
                .collect::<Result<_, _>>()?
        }
    };

    if values.len() > length {
        return Err(SemanticError::TooManyInitializers {
            name: name.to_string(),
            capacity: length,
            found: values.len(),
            span: init.span().clone(),
        });
    }
    Ok(Initializer::List(values.into_iter().map(Initializer::Value).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tests::parser_for;
    use pretty_assertions::assert_eq;

    fn initializer_of(source: &str) -> AstInitializer {
        let mut parser = parser_for(source);
        parser.parse_initializer().unwrap()
    }

    fn values(init: Initializer) -> Vec<Value> {
        init.flatten().into_iter().cloned().collect()
    }

    #[test]
    fn test_fold_negation_and_cast() {
        let init = initializer_of("-(long) 3");
        let AstInitializer::Expression(expr) = &init else {
            panic!("expected an expression");
        };
        assert_eq!(fold(expr), Some(Value::Long(-3)));
    }

    #[test]
    fn test_scalar_conversion_to_declared_type() {
        let init = global_initializer("f", &PrimitiveType::FLOAT, &initializer_of("-2")).unwrap();
        assert_eq!(init, Initializer::Value(Value::Float(-2.0)));
        let init = global_initializer("c", &PrimitiveType::CHAR, &initializer_of("'a'")).unwrap();
        assert_eq!(init, Initializer::Value(Value::Char(b'a')));
    }

    #[test]
    fn test_nested_array_list_is_flattened() {
        let ty = PrimitiveType::Array {
            element: ScalarType::Long,
            length: 4,
        };
        let init = global_initializer("a", &ty, &initializer_of("{1, {2, 3}}")).unwrap();
        assert_eq!(values(init), vec![Value::Long(1), Value::Long(2), Value::Long(3)]);
    }

    #[test]
    fn test_char_array_from_string() {
        let ty = PrimitiveType::Array {
            element: ScalarType::Char,
            length: 8,
        };
        let init = global_initializer("s", &ty, &initializer_of("\"hi\"")).unwrap();
        assert_eq!(values(init), vec![Value::Char(b'h'), Value::Char(b'i'), Value::Char(0)]);
    }

    #[test]
    fn test_rejects_non_constants_and_overflow() {
        let err = global_initializer("x", &PrimitiveType::INT, &initializer_of("y + 1")).unwrap_err();
        assert!(matches!(err, SemanticError::NonConstantInitializer { .. }));
        let ty = PrimitiveType::Array {
            element: ScalarType::Int,
            length: 1,
        };
        let err = global_initializer("a", &ty, &initializer_of("{1, 2}")).unwrap_err();
        assert!(matches!(err, SemanticError::TooManyInitializers { found: 2, .. }));
    }

    #[test]
    fn test_null_pointer_initializer() {
        let ty = PrimitiveType::Pointer(ScalarType::Int);
        let init = global_initializer("p", &ty, &initializer_of("0")).unwrap();
        assert_eq!(init, Initializer::Value(Value::Long(0)));
    }
}
