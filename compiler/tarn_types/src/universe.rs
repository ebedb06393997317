//! Every type definition of a module, keyed by the definition's [`Path`].
//!
//! Lowering fills the universe in a pre-pass before any inference runs, so
//! definitions may refer to each other (and to themselves) in any order.

use rustc_hash::{FxHashMap, FxHashSet};
use tarn_ir::{AbstractType, Intrinsic, Name, Path, Type};

#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum TypeError {
    #[error("type takes {expected} argument(s) but {found} were supplied")]
    Arity {
        path: Path,
        expected: u32,
        found: usize,
    },
    #[error("no type definition for this path")]
    Undefined(Path),
}

/// A variant constructor of a sum definition.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConstructorInfo {
    /// The sum type the constructor builds.
    pub owner: Path,
    pub name: Name,
    /// Position in the sum's variant list.
    pub tag: u32,
    /// Payload type in terms of the owner's parameters.
    pub payload: Option<Type>,
}

#[derive(Default, Debug)]
pub struct Universe {
    definitions: FxHashMap<Path, AbstractType>,
    aliases: FxHashSet<Path>,
    constructors: FxHashMap<Path, ConstructorInfo>,
    intrinsics: FxHashMap<Path, Intrinsic>,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a nominal definition (record or sum).
    pub fn insert(&mut self, path: Path, definition: AbstractType) {
        tracing::trace!(salt = path.salt, arity = definition.arity, "define type");
        self.aliases.remove(&path);
        self.definitions.insert(path, definition);
    }

    /// Add or replace a definition that is a bare type expression.
    pub fn insert_alias(&mut self, path: Path, definition: AbstractType) {
        tracing::trace!(salt = path.salt, arity = definition.arity, "define alias");
        self.aliases.insert(path);
        self.definitions.insert(path, definition);
    }

    pub fn get(&self, path: Path) -> Option<&AbstractType> {
        self.definitions.get(&path)
    }

    pub fn contains(&self, path: Path) -> bool {
        self.definitions.contains_key(&path)
    }

    pub fn is_alias(&self, path: Path) -> bool {
        self.aliases.contains(&path)
    }

    /// Every definition, in no particular order.
    pub fn definitions(&self) -> impl Iterator<Item = (Path, &AbstractType)> {
        self.definitions.iter().map(|(path, definition)| (*path, definition))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Build `path args` after checking the argument count. The
    /// definition is not expanded.
    pub fn instantiate(&self, path: Path, args: Vec<Type>) -> Result<Type, TypeError> {
        let definition = self.get(path).ok_or(TypeError::Undefined(path))?;
        if definition.arity as usize != args.len() {
            return Err(TypeError::Arity {
                path,
                expected: definition.arity,
                found: args.len(),
            });
        }
        Ok(Type::Instantiation { path, args })
    }

    /// Substitute `args` into the definition of `path`. Instantiations
    /// inside the result are left as they are.
    pub fn expand(&self, path: Path, args: &[Type]) -> Result<Type, TypeError> {
        let definition = self.get(path).ok_or(TypeError::Undefined(path))?;
        if definition.arity as usize != args.len() {
            return Err(TypeError::Arity {
                path,
                expected: definition.arity,
                found: args.len(),
            });
        }
        tracing::trace!(salt = path.salt, "expand");
        Ok(definition.expand(args))
    }

    pub fn add_constructor(&mut self, path: Path, info: ConstructorInfo) {
        self.constructors.insert(path, info);
    }

    pub fn constructor(&self, path: Path) -> Option<&ConstructorInfo> {
        self.constructors.get(&path)
    }

    /// Mark `path` as the prelude function for `op`.
    pub fn register_intrinsic(&mut self, path: Path, op: Intrinsic) {
        self.intrinsics.insert(path, op);
    }

    pub fn intrinsic(&self, path: Path) -> Option<Intrinsic> {
        self.intrinsics.get(&path).copied()
    }

    /// Aliases whose chain of head definitions leads back to themselves,
    /// e.g. `type a = b; type b = a;`. Sorted by definition order.
    pub fn check_alias_cycles(&self) -> Vec<Path> {
        let mut cyclic: Vec<Path> = self
            .aliases
            .iter()
            .copied()
            .filter(|&path| self.alias_returns_to(path))
            .collect();
        cyclic.sort_by_key(|path| path.salt);
        cyclic
    }

    fn alias_returns_to(&self, start: Path) -> bool {
        let mut seen = FxHashSet::default();
        let mut current = start;
        loop {
            let Some(definition) = self.get(current) else {
                return false;
            };
            let Type::Instantiation { path: next, .. } = &definition.base else {
                return false;
            };
            if *next == start {
                return true;
            }
            // A cycle further down the chain that does not include `start`.
            if !self.is_alias(*next) || !seen.insert(*next) {
                return false;
            }
            current = *next;
        }
    }

    /// Replace a broken definition so later passes treat its uses as
    /// already-reported errors.
    pub fn poison(&mut self, path: Path) {
        if let Some(definition) = self.definitions.get_mut(&path) {
            definition.base = Type::Unresolved;
        }
    }
}
