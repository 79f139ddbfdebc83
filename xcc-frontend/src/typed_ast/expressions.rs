//! Typed expressions

use crate::ast::{BinaryOp, UnaryOp};
use xcc_common::{PrimitiveType, ScalarType, Symbol, Value};

/// A storage location an expression can read or write
#[derive(Debug, Clone, PartialEq)]
pub enum LValue {
    Variable(Symbol),

    /// The object at `address`, an expression of type `pointer`
    Dereference {
        address: Box<TypedExpr>,
        pointer: PrimitiveType,
    },
}

impl LValue {
    pub fn ty(&self) -> PrimitiveType {
        match self {
            LValue::Variable(symbol) => symbol.ty,
            LValue::Dereference { pointer, .. } => pointer.element().map_or(PrimitiveType::Void, PrimitiveType::Scalar),
        }
    }
}

/// Typed expression - produced by semantic analysis
#[derive(Debug, Clone, PartialEq)]
pub enum TypedExpr {
    Literal(Value),

    /// Value of an lvalue. Loading an array variable yields its address; the
    /// node keeps the array type so `print` can see the length.
    Load(LValue),

    /// Address of a variable
    AddressOf {
        target: Symbol,
        ty: PrimitiveType,
    },

    /// `-`, `~` or `!`
    Unary {
        op: UnaryOp,
        operand: Box<TypedExpr>,
        ty: PrimitiveType,
    },

    /// Arithmetic or relational operation on operands of one common type
    Binary {
        op: BinaryOp,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
        ty: PrimitiveType,
    },

    /// Short-circuit `&&` / `||`, always `long` 0 or 1
    Logical {
        op: BinaryOp,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },

    /// Evaluates to the stored value
    Assign {
        target: LValue,
        value: Box<TypedExpr>,
    },

    /// `++`/`--` on a variable of integer or pointer type
    IncDec {
        target: Symbol,
        increment: bool,
        postfix: bool,
    },

    Call {
        name: String,
        arguments: Vec<TypedExpr>,
        ty: PrimitiveType,
    },

    Convert {
        operand: Box<TypedExpr>,
        from: ScalarType,
        to: ScalarType,
    },

    /// `pointer ± offset * sizeof(element)`; `offset` is a long
    PointerOffset {
        pointer: Box<TypedExpr>,
        offset: Box<TypedExpr>,
        element: ScalarType,
        subtract: bool,
    },
}

impl TypedExpr {
    pub fn ty(&self) -> PrimitiveType {
        match self {
            TypedExpr::Literal(value) => value.ty(),
            TypedExpr::Load(lvalue) => lvalue.ty(),
            TypedExpr::AddressOf { ty, .. }
            | TypedExpr::Unary { ty, .. }
            | TypedExpr::Binary { ty, .. }
            | TypedExpr::Call { ty, .. } => *ty,
            TypedExpr::Logical { .. } => PrimitiveType::LONG,
            TypedExpr::Assign { target, .. } => target.ty(),
            TypedExpr::IncDec { target, .. } => target.ty,
            TypedExpr::Convert { to, .. } => PrimitiveType::Scalar(*to),
            TypedExpr::PointerOffset { element, .. } => PrimitiveType::Pointer(*element),
        }
    }

    /// Type in value position, with arrays decayed to pointers
    pub fn value_type(&self) -> PrimitiveType {
        self.ty().decay()
    }
}
