//! Core data types shared by the frontend and the code generator
//!
//! The language has four scalar types, pointers to scalars and one
//! dimensional arrays of scalars. Everything the backend needs to know
//! about a name (its type and where it lives) is carried by [`Symbol`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Scalar value types, ordered by conversion rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalarType {
    Char,
    Int,
    Long,
    Float,
}

impl ScalarType {
    /// Storage size in bytes
    pub fn size(self) -> usize {
        match self {
            ScalarType::Char => 1,
            ScalarType::Int => 4,
            ScalarType::Long | ScalarType::Float => 8,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, ScalarType::Float)
    }

    /// The common type two operands are converted to before a binary operation.
    /// Char operands are promoted to int.
    pub fn common(self, other: ScalarType) -> ScalarType {
        self.max(other).max(ScalarType::Int)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Char => write!(f, "char"),
            ScalarType::Int => write!(f, "int"),
            ScalarType::Long => write!(f, "long"),
            ScalarType::Float => write!(f, "float"),
        }
    }
}

/// A resolved primitive type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Void,
    Scalar(ScalarType),
    Pointer(ScalarType),
    Array { element: ScalarType, length: usize },
}

impl PrimitiveType {
    pub const CHAR: PrimitiveType = PrimitiveType::Scalar(ScalarType::Char);
    pub const INT: PrimitiveType = PrimitiveType::Scalar(ScalarType::Int);
    pub const LONG: PrimitiveType = PrimitiveType::Scalar(ScalarType::Long);
    pub const FLOAT: PrimitiveType = PrimitiveType::Scalar(ScalarType::Float);

    /// Storage size in bytes. Pointers are 8 bytes wide.
    pub fn size(&self) -> usize {
        match self {
            PrimitiveType::Void => 0,
            PrimitiveType::Scalar(s) => s.size(),
            PrimitiveType::Pointer(_) => 8,
            PrimitiveType::Array { element, length } => element.size() * length,
        }
    }

    /// Alignment in bytes
    pub fn align(&self) -> usize {
        match self {
            PrimitiveType::Void => 1,
            PrimitiveType::Scalar(s) | PrimitiveType::Array { element: s, .. } => s.size(),
            PrimitiveType::Pointer(_) => 8,
        }
    }

    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            PrimitiveType::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    /// Pointed-to or element type of pointers and arrays
    pub fn element(&self) -> Option<ScalarType> {
        match self {
            PrimitiveType::Pointer(e) | PrimitiveType::Array { element: e, .. } => Some(*e),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, PrimitiveType::Void)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, PrimitiveType::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, PrimitiveType::Array { .. })
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, PrimitiveType::Scalar(s) if s.is_integer())
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveType::Scalar(ScalarType::Float))
    }

    /// Arrays decay to a pointer to their first element in value position.
    pub fn decay(&self) -> PrimitiveType {
        match self {
            PrimitiveType::Array { element, .. } => PrimitiveType::Pointer(*element),
            other => *other,
        }
    }
}

impl From<ScalarType> for PrimitiveType {
    fn from(s: ScalarType) -> Self {
        PrimitiveType::Scalar(s)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Void => write!(f, "void"),
            PrimitiveType::Scalar(s) => write!(f, "{s}"),
            PrimitiveType::Pointer(s) => write!(f, "{s}*"),
            PrimitiveType::Array { element, length } => write!(f, "{element}[{length}]"),
        }
    }
}

/// A constant value with exactly one active payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Char(u8),
    Long(i64),
    Float(f64),
    Str(String),
}

impl Value {
    pub fn ty(&self) -> PrimitiveType {
        match self {
            Value::Int(_) => PrimitiveType::INT,
            Value::Char(_) => PrimitiveType::CHAR,
            Value::Long(_) => PrimitiveType::LONG,
            Value::Float(_) => PrimitiveType::FLOAT,
            Value::Str(_) => PrimitiveType::Pointer(ScalarType::Char),
        }
    }

    /// Integer payload widened to 64 bits; `None` for floats and strings.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(i64::from(*v)),
            Value::Char(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            Value::Float(_) | Value::Str(_) => None,
        }
    }

    /// Convert a numeric constant to `target`, with C truncation rules.
    pub fn convert(&self, target: ScalarType) -> Option<Value> {
        let converted = match (self, target) {
            (Value::Str(_), _) => return None,
            (Value::Float(f), ScalarType::Float) => Value::Float(*f),
            (Value::Float(f), ScalarType::Long) => Value::Long(*f as i64),
            (Value::Float(f), ScalarType::Int) => Value::Int(*f as i32),
            (Value::Float(f), ScalarType::Char) => Value::Char(*f as i64 as u8),
            (v, ScalarType::Float) => Value::Float(v.as_i64()? as f64),
            (v, ScalarType::Long) => Value::Long(v.as_i64()?),
            (v, ScalarType::Int) => Value::Int(v.as_i64()? as i32),
            (v, ScalarType::Char) => Value::Char(v.as_i64()? as u8),
        };
        Some(converted)
    }

    /// Arithmetic negation of a numeric constant
    pub fn negate(&self) -> Option<Value> {
        match self {
            Value::Int(v) => Some(Value::Int(v.wrapping_neg())),
            Value::Char(v) => Some(Value::Int(-i32::from(*v))),
            Value::Long(v) => Some(Value::Long(v.wrapping_neg())),
            Value::Float(v) => Some(Value::Float(-v)),
            Value::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
        }
    }
}

/// Where a symbol's storage lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// A data-section label, addressed relative to `%rip`
    Global(String),
    /// A byte offset from the frame pointer
    Frame(i32),
}

impl Address {
    /// Addressing expression for the byte `offset` bytes past this address.
    pub fn at(&self, offset: i32) -> String {
        match self {
            Address::Global(label) if offset == 0 => format!("{label}(%rip)"),
            Address::Global(label) => format!("{label}+{offset}(%rip)"),
            Address::Frame(base) => format!("{}(%rbp)", base + offset),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.at(0))
    }
}

/// A name resolved by semantic analysis
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub ty: PrimitiveType,
    pub address: Address,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: PrimitiveType, address: Address) -> Self {
        Self {
            name: name.into(),
            ty,
            address,
        }
    }

    pub fn global(name: impl Into<String>, ty: PrimitiveType) -> Self {
        let name = name.into();
        let address = Address::Global(name.clone());
        Self { name, ty, address }
    }

    pub fn local(name: impl Into<String>, ty: PrimitiveType, offset: i32) -> Self {
        Self::new(name, ty, Address::Frame(offset))
    }

    pub fn is_global(&self) -> bool {
        matches!(self.address, Address::Global(_))
    }
}

/// Function metadata consumed by the code generator
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub name: String,
    pub return_type: PrimitiveType,
    pub parameters: Vec<PrimitiveType>,
    /// Bytes of frame reserved for locals, a multiple of 16
    pub stack_size: usize,
}

/// A constant initializer for global storage, possibly nested
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Value(Value),
    List(Vec<Initializer>),
}

impl Initializer {
    /// Depth-first flattening of nested lists into element values
    pub fn flatten(&self) -> Vec<&Value> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into<'a>(&'a self, out: &mut Vec<&'a Value>) {
        match self {
            Initializer::Value(v) => out.push(v),
            Initializer::List(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

/// Label counters kept separately for each statement kind
#[derive(Debug, Clone, Default)]
pub struct LabelGenerator {
    counters: HashMap<&'static str, u32>,
}

impl LabelGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for `kind`; ids for one kind increase monotonically from 0.
    pub fn next_id(&mut self, kind: &'static str) -> u32 {
        let counter = self.counters.entry(kind).or_insert(0);
        let id = *counter;
        *counter += 1;
        id
    }

    /// Assembler-local label name, e.g. `.Lwhile3_end`
    pub fn label(kind: &str, id: u32, role: &str) -> String {
        format!(".L{kind}{id}_{role}")
    }
}
