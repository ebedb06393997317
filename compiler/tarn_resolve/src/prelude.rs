//! The implicit `prelude` module: builtin types and operator functions.

use tarn_ir::{Intrinsic, Path, Type};

/// Types every module can name without defining them.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BuiltinType {
    Int,
    Real,
    Bool,
    Text,
    Char,
    Unit,
}

impl BuiltinType {
    pub const COUNT: usize = 6;

    pub const ALL: [BuiltinType; Self::COUNT] = [
        BuiltinType::Int,
        BuiltinType::Real,
        BuiltinType::Bool,
        BuiltinType::Text,
        BuiltinType::Char,
        BuiltinType::Unit,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BuiltinType::Int => "int",
            BuiltinType::Real => "real",
            BuiltinType::Bool => "bool",
            BuiltinType::Text => "text",
            BuiltinType::Char => "char",
            BuiltinType::Unit => "unit",
        }
    }

    pub fn ty(self) -> Type {
        match self {
            BuiltinType::Int => Type::Int,
            BuiltinType::Real => Type::Real,
            BuiltinType::Bool => Type::Bool,
            BuiltinType::Text => Type::Text,
            BuiltinType::Char => Type::Char,
            BuiltinType::Unit => Type::Unit,
        }
    }
}

/// Paths minted for the prelude when a [`Resolver`](crate::Resolver) is
/// created.
#[derive(Clone, Debug)]
pub struct Prelude {
    module: Path,
    operators: [Path; Intrinsic::COUNT],
    types: [Path; BuiltinType::COUNT],
}

impl Prelude {
    pub(crate) fn new(
        module: Path,
        operators: [Path; Intrinsic::COUNT],
        types: [Path; BuiltinType::COUNT],
    ) -> Self {
        Prelude {
            module,
            operators,
            types,
        }
    }

    /// Path of the `prelude` module itself.
    pub fn module(&self) -> Path {
        self.module
    }

    /// The function an operator desugars to.
    pub fn operator(&self, op: Intrinsic) -> Path {
        self.operators[op as usize]
    }

    pub fn operators(&self) -> impl Iterator<Item = (Intrinsic, Path)> + '_ {
        Intrinsic::ALL.iter().copied().zip(self.operators.iter().copied())
    }

    pub fn builtin_type(&self, path: Path) -> Option<Type> {
        BuiltinType::ALL
            .iter()
            .zip(self.types.iter())
            .find(|(_, p)| **p == path)
            .map(|(builtin, _)| builtin.ty())
    }

    pub fn type_path(&self, builtin: BuiltinType) -> Path {
        self.types[builtin as usize]
    }
}
