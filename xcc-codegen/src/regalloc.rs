//! Register Management
//!
//! A fixed, typed register file with no spilling. Values of type int, char
//! and long live in the same physical slots viewed at different widths, so
//! allocating or freeing any one of those classes at slot `i` marks all
//! three aliases together. Float slots are separate storage.
//!
//! The architecture only supplies the name tables through [`RegisterFile`];
//! the allocation bookkeeping is shared.

use crate::error::CodegenError;
use log::trace;
use std::fmt;
use std::marker::PhantomData;
use xcc_common::PrimitiveType;

/// Which register pool (and which width) a value occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Int,
    Char,
    Long,
    Float,
}

impl TypeClass {
    const FLOAT_ONLY: [TypeClass; 1] = [TypeClass::Float];
    const INTEGER_FAMILY: [TypeClass; 3] = [TypeClass::Int, TypeClass::Char, TypeClass::Long];

    fn index(self) -> usize {
        match self {
            TypeClass::Int => 0,
            TypeClass::Char => 1,
            TypeClass::Long => 2,
            TypeClass::Float => 3,
        }
    }

    pub fn is_integer_family(self) -> bool {
        !matches!(self, TypeClass::Float)
    }

    /// Register class holding values of `ty`. Pointers and arrays are
    /// addresses and use the long class.
    pub fn of(ty: &PrimitiveType) -> Result<TypeClass, CodegenError> {
        use xcc_common::ScalarType::*;
        match ty {
            PrimitiveType::Scalar(Int) => Ok(TypeClass::Int),
            PrimitiveType::Scalar(Char) => Ok(TypeClass::Char),
            PrimitiveType::Scalar(Long) => Ok(TypeClass::Long),
            PrimitiveType::Scalar(Float) => Ok(TypeClass::Float),
            PrimitiveType::Pointer(_) | PrimitiveType::Array { .. } => Ok(TypeClass::Long),
            PrimitiveType::Void => Err(CodegenError::unsupported_type("register class", ty)),
        }
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeClass::Int => write!(f, "int"),
            TypeClass::Char => write!(f, "char"),
            TypeClass::Long => write!(f, "long"),
            TypeClass::Float => write!(f, "float"),
        }
    }
}

/// A register handle: valid while its slot is allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reg {
    pub class: TypeClass,
    pub slot: usize,
}

impl Reg {
    pub fn new(class: TypeClass, slot: usize) -> Self {
        Self { class, slot }
    }

    /// The same physical slot viewed as another integer-family class.
    pub fn alias(self, class: TypeClass) -> Result<Reg, CodegenError> {
        if !self.class.is_integer_family() || !class.is_integer_family() {
            return Err(CodegenError::InvalidUsage(format!(
                "cannot view {} register {} as {class}",
                self.class, self.slot
            )));
        }
        Ok(Reg::new(class, self.slot))
    }
}

/// Architecture-specific register name tables
pub trait RegisterFile {
    const INT_SLOTS: usize;
    const FLOAT_SLOTS: usize;

    /// Name of `slot` when viewed as `class`
    fn name(class: TypeClass, slot: usize) -> Option<&'static str>;

    /// 8-bit alias of an integer slot
    fn byte_name(slot: usize) -> Option<&'static str>;
}

pub struct RegisterManager<F: RegisterFile> {
    status: [Vec<bool>; 4],
    allocations: usize,
    frees: usize,
    file: PhantomData<F>,
}

impl<F: RegisterFile> Default for RegisterManager<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: RegisterFile> RegisterManager<F> {
    pub fn new() -> Self {
        Self {
            status: [
                vec![false; F::INT_SLOTS],
                vec![false; F::INT_SLOTS],
                vec![false; F::INT_SLOTS],
                vec![false; F::FLOAT_SLOTS],
            ],
            allocations: 0,
            frees: 0,
            file: PhantomData,
        }
    }

    fn slots(class: TypeClass) -> usize {
        if class.is_integer_family() {
            F::INT_SLOTS
        } else {
            F::FLOAT_SLOTS
        }
    }

    /// Classes that share storage with `class`
    fn aliases(class: TypeClass) -> &'static [TypeClass] {
        if class.is_integer_family() {
            &TypeClass::INTEGER_FAMILY
        } else {
            &TypeClass::FLOAT_ONLY
        }
    }

    /// Allocate the first free slot of `class`, marking every alias of it.
    pub fn allocate(&mut self, class: TypeClass) -> Result<Reg, CodegenError> {
        let pool = &self.status[class.index()];
        let slot = pool
            .iter()
            .position(|used| !used)
            .ok_or(CodegenError::ResourceExhausted { class })?;
        for alias in Self::aliases(class) {
            self.status[alias.index()][slot] = true;
        }
        self.allocations += 1;
        trace!("allocate {class} slot {slot}");
        Ok(Reg::new(class, slot))
    }

    pub fn free(&mut self, reg: Reg) -> Result<(), CodegenError> {
        self.check(reg)?;
        for alias in Self::aliases(reg.class) {
            self.status[alias.index()][reg.slot] = false;
        }
        self.frees += 1;
        trace!("free {} slot {}", reg.class, reg.slot);
        Ok(())
    }

    /// Clear every allocation flag. The counters are left alone so leaks
    /// stay visible through [`net_allocations`](Self::net_allocations).
    pub fn free_all(&mut self) {
        for pool in &mut self.status {
            pool.iter_mut().for_each(|used| *used = false);
        }
    }

    pub fn is_allocated(&self, class: TypeClass, slot: usize) -> bool {
        self.status[class.index()].get(slot).copied().unwrap_or(false)
    }

    /// Fails unless `reg` names an allocated, in-range slot.
    pub fn check(&self, reg: Reg) -> Result<(), CodegenError> {
        if reg.slot >= Self::slots(reg.class) {
            return Err(CodegenError::OutOfRange {
                class: reg.class,
                slot: reg.slot,
            });
        }
        if !self.is_allocated(reg.class, reg.slot) {
            return Err(CodegenError::InvalidUsage(format!(
                "{} register {} is not allocated",
                reg.class, reg.slot
            )));
        }
        Ok(())
    }

    pub fn name_of(&self, reg: Reg) -> Result<&'static str, CodegenError> {
        self.check(reg)?;
        F::name(reg.class, reg.slot).ok_or(CodegenError::OutOfRange {
            class: reg.class,
            slot: reg.slot,
        })
    }

    /// 8-bit alias, the target of `setcc`
    pub fn lower_half_name_of(&self, reg: Reg) -> Result<&'static str, CodegenError> {
        self.check(reg)?;
        if !reg.class.is_integer_family() {
            return Err(CodegenError::InvalidUsage(format!(
                "float register {} has no byte alias",
                reg.slot
            )));
        }
        F::byte_name(reg.slot).ok_or(CodegenError::OutOfRange {
            class: reg.class,
            slot: reg.slot,
        })
    }

    /// Currently allocated registers of one pool, in slot order
    pub fn live(&self, class: TypeClass) -> Vec<Reg> {
        self.status[class.index()]
            .iter()
            .enumerate()
            .filter(|(_, used)| **used)
            .map(|(slot, _)| Reg::new(class, slot))
            .collect()
    }

    /// Number of physical slots currently in use
    pub fn live_count(&self) -> usize {
        self.live(TypeClass::Long).len() + self.live(TypeClass::Float).len()
    }

    /// Allocations minus frees since construction
    pub fn net_allocations(&self) -> isize {
        self.allocations as isize - self.frees as isize
    }
}
