//! Resolved, globally unique names.

use std::fmt;

use crate::{Name, StringInterner};

/// A resolved binding: the defining module, the surface name and a salt
/// that tells apart bindings sharing a name (shadowing, nested scopes).
///
/// Paths are minted by the resolver and never change afterwards.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Path {
    pub module: Name,
    pub name: Name,
    pub salt: u32,
}

impl Path {
    /// Salt reserved for names that failed to resolve.
    pub const POISON_SALT: u32 = u32::MAX;

    #[inline]
    pub const fn new(module: Name, name: Name, salt: u32) -> Self {
        Path { module, name, salt }
    }

    /// Placeholder for an unresolved name. Later passes treat it as an
    /// error value and never report on it again.
    #[inline]
    pub const fn poisoned(name: Name) -> Self {
        Path {
            module: Name::EMPTY,
            name,
            salt: Self::POISON_SALT,
        }
    }

    #[inline]
    pub const fn is_poisoned(&self) -> bool {
        self.salt == Self::POISON_SALT
    }

    /// Render as `module::name#salt`.
    pub fn display<'a>(&'a self, interner: &'a StringInterner) -> PathDisplay<'a> {
        PathDisplay {
            path: self,
            interner,
        }
    }
}

pub struct PathDisplay<'a> {
    path: &'a Path,
    interner: &'a StringInterner,
}

impl fmt::Display for PathDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_poisoned() {
            return write!(f, "{}#?", self.interner.lookup(self.path.name));
        }
        write!(
            f,
            "{}::{}#{}",
            self.interner.lookup(self.path.module),
            self.interner.lookup(self.path.name),
            self.path.salt
        )
    }
}
