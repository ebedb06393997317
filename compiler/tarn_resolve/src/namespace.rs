//! A single namespace: surface names to their current [`Path`].
//!
//! Scopes are not separate maps. Every definition pushes an undo record
//! holding whatever the name meant before, and leaving a scope replays the
//! records back to the mark taken on entry. Lookup is one hash probe no
//! matter how deeply scopes nest.

use rustc_hash::FxHashMap;
use tarn_ir::{Name, Path, Span};

/// Which namespace a name lives in. Fixed by syntactic position.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NameKind {
    Value,
    Type,
    Module,
}

impl NameKind {
    pub const fn describe(self) -> &'static str {
        match self {
            NameKind::Value => "value",
            NameKind::Type => "type",
            NameKind::Module => "module",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("name not found")]
    NotFound,
}

/// A live binding and the lexical scope depth it was introduced at.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct Binding {
    path: Path,
    scope_depth: u32,
    span: Span,
}

#[derive(Copy, Clone, Debug)]
struct UndoRecord {
    name: Name,
    previous: Option<Binding>,
}

/// Result of [`NameSpace::define`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Definition {
    pub path: Path,
    /// Span of a binding of the same name in the same scope, now shadowed.
    pub collision: Option<Span>,
}

pub struct NameSpace {
    kind: NameKind,
    bindings: FxHashMap<Name, Binding>,
    next_salt: u32,
    history: Vec<UndoRecord>,
    function_depths: FxHashMap<Path, u32>,
}

impl NameSpace {
    pub fn new(kind: NameKind) -> Self {
        NameSpace {
            kind,
            bindings: FxHashMap::default(),
            next_salt: 0,
            history: Vec::new(),
            function_depths: FxHashMap::default(),
        }
    }

    pub fn kind(&self) -> NameKind {
        self.kind
    }

    /// Mint a fresh path for `name` and make it the current meaning.
    ///
    /// The salt counter never goes back, so paths stay unique across
    /// scopes that have been exited.
    pub fn define(
        &mut self,
        module: Name,
        name: Name,
        span: Span,
        scope_depth: u32,
        function_depth: u32,
    ) -> Definition {
        let path = Path::new(module, name, self.next_salt);
        self.next_salt += 1;

        let binding = Binding {
            path,
            scope_depth,
            span,
        };
        let previous = self.bindings.insert(name, binding);
        self.history.push(UndoRecord { name, previous });
        self.function_depths.insert(path, function_depth);

        let collision = previous
            .filter(|p| p.scope_depth == scope_depth)
            .map(|p| p.span);
        tracing::trace!(kind = ?self.kind, salt = path.salt, collision = collision.is_some(), "define");
        Definition { path, collision }
    }

    pub fn lookup(&self, name: Name) -> Result<Path, ResolveError> {
        self.bindings
            .get(&name)
            .map(|b| b.path)
            .ok_or(ResolveError::NotFound)
    }

    /// Position in the undo history.
    pub fn mark(&self) -> usize {
        self.history.len()
    }

    /// Undo every definition made since `mark`, most recent first.
    pub fn rewind(&mut self, mark: usize) {
        while self.history.len() > mark {
            let Some(record) = self.history.pop() else {
                break;
            };
            match record.previous {
                Some(binding) => {
                    self.bindings.insert(record.name, binding);
                }
                None => {
                    self.bindings.remove(&record.name);
                }
            }
        }
    }

    /// Function nesting depth `path` was defined at.
    pub fn function_depth_of(&self, path: Path) -> Option<u32> {
        self.function_depths.get(&path).copied()
    }

    /// Live bindings introduced at exactly `scope_depth`, in definition
    /// order.
    pub fn bindings_at_depth(&self, scope_depth: u32) -> Vec<(Name, Path)> {
        let mut found: Vec<(Name, Path)> = self
            .bindings
            .iter()
            .filter(|(_, b)| b.scope_depth == scope_depth)
            .map(|(name, b)| (*name, b.path))
            .collect();
        found.sort_by_key(|(_, path)| path.salt);
        found
    }
}
