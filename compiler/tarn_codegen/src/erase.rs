//! Type erasure: semantic [`Type`]s to machine representations.
//!
//! Erasure walks a type with a set of instantiations currently being
//! erased. Meeting one of them again means the type refers to itself
//! through a record, and that reference becomes [`ReducedType::OpaqueRef`],
//! so every recursive type erases to a finite value.

use std::fmt;

use rustc_hash::FxHashSet;
use tarn_ir::{Path, Type};
use tarn_stack::ensure_sufficient_stack;
use tarn_types::{TypeError, Universe};

use crate::CodegenError;

/// Machine-level representation of a value.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ReducedType {
    /// Pointer to a heap object the machine does not look into: text,
    /// polymorphic values, recursive references.
    OpaqueRef,
    /// Tag plus optional payload.
    TaggedVariant,
    I64,
    F64,
    I32,
    I8,
    /// A closure.
    FunctionRef,
    Product(Vec<ReducedType>),
    Array(Box<ReducedType>),
}

impl ReducedType {
    pub fn unit() -> Self {
        ReducedType::Product(Vec::new())
    }
}

impl fmt::Display for ReducedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReducedType::OpaqueRef => f.write_str("ref"),
            ReducedType::TaggedVariant => f.write_str("variant"),
            ReducedType::I64 => f.write_str("i64"),
            ReducedType::F64 => f.write_str("f64"),
            ReducedType::I32 => f.write_str("i32"),
            ReducedType::I8 => f.write_str("i8"),
            ReducedType::FunctionRef => f.write_str("funcref"),
            ReducedType::Product(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            ReducedType::Array(element) => write!(f, "[{element}]"),
        }
    }
}

/// Erase `ty` against the definitions in `universe`.
pub fn erase(ty: &Type, universe: &Universe) -> Result<ReducedType, CodegenError> {
    Eraser::new(universe).erase(ty)
}

pub(crate) struct Eraser<'u> {
    universe: &'u Universe,
    in_progress: FxHashSet<(Path, Vec<Type>)>,
}

impl<'u> Eraser<'u> {
    pub(crate) fn new(universe: &'u Universe) -> Self {
        Eraser {
            universe,
            in_progress: FxHashSet::default(),
        }
    }

    pub(crate) fn erase(&mut self, ty: &Type) -> Result<ReducedType, CodegenError> {
        ensure_sufficient_stack(|| self.erase_inner(ty))
    }

    fn erase_inner(&mut self, ty: &Type) -> Result<ReducedType, CodegenError> {
        Ok(match ty {
            Type::Unresolved => return Err(CodegenError::ErasureGap),
            Type::Unit => ReducedType::unit(),
            Type::Int => ReducedType::I64,
            Type::Real => ReducedType::F64,
            Type::Bool => ReducedType::I8,
            Type::Char => ReducedType::I32,
            // Polymorphic values share one boxed representation.
            Type::Text | Type::Var(_) => ReducedType::OpaqueRef,
            Type::Record { fields, .. } => ReducedType::Product(
                fields
                    .iter()
                    .map(|(_, field)| self.erase(field))
                    .collect::<Result<_, _>>()?,
            ),
            Type::Array(element) => ReducedType::Array(Box::new(self.erase(element)?)),
            Type::Product(items) => ReducedType::Product(
                items
                    .iter()
                    .map(|item| self.erase(item))
                    .collect::<Result<_, _>>()?,
            ),
            Type::Sum { .. } => ReducedType::TaggedVariant,
            Type::Function(..) => ReducedType::FunctionRef,
            Type::Instantiation { path, args } => {
                let definition = self
                    .universe
                    .get(*path)
                    .ok_or(CodegenError::UnknownType(*path))?;
                if matches!(definition.base, Type::Sum { .. }) {
                    return Ok(ReducedType::TaggedVariant);
                }
                let key = (*path, args.clone());
                if self.in_progress.contains(&key) {
                    tracing::trace!(salt = path.salt, "recursive reference erased to a pointer");
                    return Ok(ReducedType::OpaqueRef);
                }
                let expanded = expand(self.universe, *path, args)?;
                self.in_progress.insert(key.clone());
                let result = self.erase(&expanded);
                self.in_progress.remove(&key);
                result?
            }
        })
    }
}

/// One layer of `path args`, with the universe's errors turned into
/// generation errors.
pub(crate) fn expand(universe: &Universe, path: Path, args: &[Type]) -> Result<Type, CodegenError> {
    universe.expand(path, args).map_err(|error| match error {
        TypeError::Arity {
            path,
            expected,
            found,
        } => CodegenError::InstantiationArity {
            path,
            expected,
            found,
        },
        TypeError::Undefined(path) => CodegenError::UnknownType(path),
    })
}

/// Expand `ty` until its head is not an instantiation.
pub(crate) fn structural(universe: &Universe, ty: &Type) -> Result<Type, CodegenError> {
    let mut current = ty.clone();
    let mut seen = FxHashSet::default();
    while let Type::Instantiation { path, args } = &current {
        if !seen.insert(*path) {
            return Err(CodegenError::ErasureGap);
        }
        current = expand(universe, *path, args)?;
    }
    Ok(current)
}
