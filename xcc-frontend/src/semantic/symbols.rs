//! Symbol tables, frame layout and type resolution

use crate::ast::{BaseType, TypeSpec};
use crate::semantic::errors::SemanticError;
use log::trace;
use std::collections::HashMap;
use xcc_common::{PrimitiveType, ScalarType, SourceSpan, Symbol};

/// Resolve a written type to a primitive type.
pub fn resolve_type(spec: &TypeSpec, span: &SourceSpan) -> Result<PrimitiveType, SemanticError> {
    let scalar = match spec.base {
        BaseType::Void if spec.pointer_depth == 0 && spec.array_length.is_none() => return Ok(PrimitiveType::Void),
        BaseType::Void => return Err(SemanticError::unsupported(format!("type {spec}"), span)),
        BaseType::Char => ScalarType::Char,
        BaseType::Int => ScalarType::Int,
        BaseType::Long => ScalarType::Long,
        BaseType::Float => ScalarType::Float,
    };
    match (spec.pointer_depth, spec.array_length) {
        (0, None) => Ok(PrimitiveType::Scalar(scalar)),
        (0, Some(length)) => Ok(PrimitiveType::Array { element: scalar, length }),
        (1, None) => Ok(PrimitiveType::Pointer(scalar)),
        _ => Err(SemanticError::unsupported(format!("type {spec}"), span)),
    }
}

/// Signature of a declared or defined function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub return_type: PrimitiveType,
    pub parameters: Vec<PrimitiveType>,
    pub defined: bool,
}

/// Nested lexical scopes; scope 0 holds the globals.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn exists_in_current_scope(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains_key(name))
    }

    pub fn declare(&mut self, symbol: Symbol, span: &SourceSpan) -> Result<(), SemanticError> {
        if self.exists_in_current_scope(&symbol.name) {
            return Err(SemanticError::RedefinedSymbol {
                name: symbol.name,
                span: span.clone(),
            });
        }
        trace!("declare {} : {} at {}", symbol.name, symbol.ty, symbol.address);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(symbol.name.clone(), symbol);
        }
        Ok(())
    }

    /// Innermost visible symbol named `name`
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

/// Assigns frame-pointer-relative slots to the locals of one function.
/// Slots are never reused, so nested scopes only grow the frame.
#[derive(Debug, Default)]
pub struct FrameLayout {
    size: usize,
}

impl FrameLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve storage for `name` of type `ty` and return its (negative)
    /// offset from `%rbp`. The whole frame must stay addressable with a
    /// 32-bit displacement.
    pub fn allocate(&mut self, name: &str, ty: &PrimitiveType, span: &SourceSpan) -> Result<i32, SemanticError> {
        let align = ty.align().max(1);
        let too_large = || SemanticError::unsupported(format!("stack frame too large for '{name}' of type {ty}"), span);
        let size = self.size.checked_add(ty.size()).ok_or_else(too_large)?.div_ceil(align) * align;
        // the rounded frame is the prologue's immediate
        i32::try_from(size.div_ceil(16) * 16).map_err(|_| too_large())?;
        let offset = i32::try_from(size).map_err(|_| too_large())?;
        self.size = size;
        Ok(-offset)
    }

    /// Frame bytes to reserve, rounded up to the 16-byte call alignment
    pub fn stack_size(&self) -> usize {
        self.size.div_ceil(16) * 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span() -> SourceSpan {
        SourceSpan::dummy()
    }

    #[test]
    fn test_resolve_types() {
        let int_ptr = TypeSpec {
            pointer_depth: 1,
            ..TypeSpec::new(BaseType::Int)
        };
        assert_eq!(resolve_type(&int_ptr, &span()).unwrap(), PrimitiveType::Pointer(ScalarType::Int));
        let floats = TypeSpec {
            array_length: Some(4),
            ..TypeSpec::new(BaseType::Float)
        };
        assert_eq!(
            resolve_type(&floats, &span()).unwrap(),
            PrimitiveType::Array {
                element: ScalarType::Float,
                length: 4
            }
        );
        assert_eq!(resolve_type(&TypeSpec::new(BaseType::Void), &span()).unwrap(), PrimitiveType::Void);
    }

    #[test]
    fn test_unsupported_types() {
        let double_pointer = TypeSpec {
            pointer_depth: 2,
            ..TypeSpec::new(BaseType::Char)
        };
        assert!(resolve_type(&double_pointer, &span()).is_err());
        let void_pointer = TypeSpec {
            pointer_depth: 1,
            ..TypeSpec::new(BaseType::Void)
        };
        assert!(resolve_type(&void_pointer, &span()).is_err());
    }

    #[test]
    fn test_frame_offsets_are_aligned() {
        let mut frame = FrameLayout::new();
        assert_eq!(frame.allocate("c", &PrimitiveType::CHAR, &span()), Ok(-1));
        assert_eq!(frame.allocate("i", &PrimitiveType::INT, &span()), Ok(-8));
        assert_eq!(frame.allocate("l", &PrimitiveType::LONG, &span()), Ok(-16));
        let array = PrimitiveType::Array {
            element: ScalarType::Int,
            length: 3,
        };
        assert_eq!(frame.allocate("a", &array, &span()), Ok(-28));
        assert_eq!(frame.stack_size(), 32);
    }

    #[test]
    fn test_frame_beyond_32_bit_displacement_is_rejected() {
        let mut frame = FrameLayout::new();
        let huge = PrimitiveType::Array {
            element: ScalarType::Int,
            length: 600_000_000,
        };
        let err = frame.allocate("a", &huge, &span()).unwrap_err();
        assert!(matches!(err, SemanticError::Unsupported { .. }));
        // the failed slot does not grow the frame
        assert_eq!(frame.stack_size(), 0);

        let mut frame = FrameLayout::new();
        let just_fits = PrimitiveType::Array {
            element: ScalarType::Char,
            length: i32::MAX as usize - 15,
        };
        assert!(frame.allocate("b", &just_fits, &span()).is_ok());
        assert!(frame.allocate("c", &PrimitiveType::CHAR, &span()).is_err());
    }

    #[test]
    fn test_scopes_shadow_and_reject_redeclaration() {
        let mut table = SymbolTable::new();
        table.declare(Symbol::global("x", PrimitiveType::INT), &span()).unwrap();
        table.push_scope();
        table.declare(Symbol::local("x", PrimitiveType::FLOAT, -8), &span()).unwrap();
        assert_eq!(table.lookup("x").map(|s| s.ty), Some(PrimitiveType::FLOAT));
        let err = table.declare(Symbol::local("x", PrimitiveType::INT, -16), &span()).unwrap_err();
        assert!(matches!(err, SemanticError::RedefinedSymbol { .. }));
        table.pop_scope();
        assert_eq!(table.lookup("x").map(|s| s.ty), Some(PrimitiveType::INT));
    }
}
