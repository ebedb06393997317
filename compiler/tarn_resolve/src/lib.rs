//! Namespace resolution for Tarn.
//!
//! Values, types and modules live in separate [`NameSpace`]s; which one a
//! name is looked up in is decided by where it appears. Resolution is not a
//! pass of its own: lowering drives the [`Resolver`] statement by statement,
//! entering and leaving scopes as it walks the tree.
//!
//! Every problem is reported to the sink and resolution carries on. A name
//! that cannot be found resolves to a poisoned [`Path`] that later passes
//! treat as an error value.

mod namespace;
mod prelude;

pub use namespace::{Definition, NameKind, NameSpace, ResolveError};
pub use prelude::{BuiltinType, Prelude};

use rustc_hash::{FxHashMap, FxHashSet};
use tarn_diagnostic::{Diagnostic, Diagnostics, ErrorCode};
use tarn_ir::ast::{Ident, QualifiedName};
use tarn_ir::{Intrinsic, Name, Path, Span, StringInterner};

/// Names a finished module makes available as `m::name`.
#[derive(Clone, Default, Debug)]
pub struct ModuleExports {
    pub values: FxHashMap<Name, Path>,
    pub types: FxHashMap<Name, Path>,
    pub modules: FxHashMap<Name, Path>,
}

impl ModuleExports {
    pub fn get(&self, kind: NameKind, name: Name) -> Option<Path> {
        let table = match kind {
            NameKind::Value => &self.values,
            NameKind::Type => &self.types,
            NameKind::Module => &self.modules,
        };
        table.get(&name).copied()
    }
}

/// Undo positions of all three namespaces plus the depths to restore.
#[must_use = "a scope must be exited with the mark it was entered with"]
#[derive(Copy, Clone, Debug)]
pub struct ScopeMark {
    values: usize,
    types: usize,
    modules: usize,
    scope_depth: u32,
    function_depth: u32,
}

#[must_use = "a module must be exited with the mark it was entered with"]
#[derive(Copy, Clone, Debug)]
pub struct ModuleMark {
    scope: ScopeMark,
    path: Path,
    outer: Name,
}

pub struct Resolver<'a> {
    interner: &'a StringInterner,
    /// Module that newly minted paths belong to.
    module: Name,
    values: NameSpace,
    types: NameSpace,
    modules: NameSpace,
    scope_depth: u32,
    function_depth: u32,
    /// Value bindings whose initializer is being lowered.
    initializing: FxHashSet<Path>,
    exports: FxHashMap<Path, ModuleExports>,
    prelude: Prelude,
}

impl<'a> Resolver<'a> {
    /// A resolver for module `module`, with the prelude defined at depth 0
    /// and the module's own scope entered.
    pub fn new(interner: &'a StringInterner, module: Name) -> Self {
        let prelude_name = interner.intern("prelude");
        let mut values = NameSpace::new(NameKind::Value);
        let mut types = NameSpace::new(NameKind::Type);
        let mut modules = NameSpace::new(NameKind::Module);

        let operators = Intrinsic::ALL.map(|op| {
            values
                .define(prelude_name, interner.intern(op.name()), Span::DUMMY, 0, 0)
                .path
        });
        let builtin_types = BuiltinType::ALL.map(|builtin| {
            types
                .define(prelude_name, interner.intern(builtin.name()), Span::DUMMY, 0, 0)
                .path
        });
        let prelude_path = modules
            .define(prelude_name, prelude_name, Span::DUMMY, 0, 0)
            .path;

        let mut exports = FxHashMap::default();
        exports.insert(
            prelude_path,
            ModuleExports {
                values: values.bindings_at_depth(0).into_iter().collect(),
                types: types.bindings_at_depth(0).into_iter().collect(),
                modules: FxHashMap::default(),
            },
        );

        tracing::debug!(module = interner.lookup(module), "resolver ready");
        Resolver {
            interner,
            module,
            values,
            types,
            modules,
            // The module body is one scope inside the prelude.
            scope_depth: 1,
            function_depth: 0,
            initializing: FxHashSet::default(),
            exports,
            prelude: Prelude::new(prelude_path, operators, builtin_types),
        }
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    pub fn prelude(&self) -> &Prelude {
        &self.prelude
    }

    /// Name of the module paths are currently minted in.
    pub fn current_module(&self) -> Name {
        self.module
    }

    pub fn scope_depth(&self) -> u32 {
        self.scope_depth
    }

    pub fn function_depth(&self) -> u32 {
        self.function_depth
    }

    fn namespace(&self, kind: NameKind) -> &NameSpace {
        match kind {
            NameKind::Value => &self.values,
            NameKind::Type => &self.types,
            NameKind::Module => &self.modules,
        }
    }

    fn namespace_mut(&mut self, kind: NameKind) -> &mut NameSpace {
        match kind {
            NameKind::Value => &mut self.values,
            NameKind::Type => &mut self.types,
            NameKind::Module => &mut self.modules,
        }
    }

    /// Bind `name` in the current scope. Redefining a name the same scope
    /// already bound is an `E2002` error; the new binding shadows anyway.
    pub fn define(&mut self, kind: NameKind, name: Ident, sink: &mut Diagnostics) -> Path {
        let (module, scope_depth, function_depth) =
            (self.module, self.scope_depth, self.function_depth);
        let definition =
            self.namespace_mut(kind)
                .define(module, name.value, name.span, scope_depth, function_depth);
        if let Some(previous) = definition.collision {
            sink.push(
                Diagnostic::error(ErrorCode::E2002)
                    .with_message(format!(
                        "the {} `{}` is defined more than once in this scope",
                        kind.describe(),
                        self.interner.lookup(name.value)
                    ))
                    .with_span(name.span)
                    .with_label(previous, "previous definition here"),
            );
        }
        definition.path
    }

    /// Bind a compiler-generated value name. Such names cannot be written in
    /// source, so they never collide.
    pub fn define_hidden(&mut self, name: &str, span: Span) -> Path {
        let name = self.interner.intern(name);
        let (module, scope_depth, function_depth) =
            (self.module, self.scope_depth, self.function_depth);
        self.values
            .define(module, name, span, scope_depth, function_depth)
            .path
    }

    pub fn lookup(&self, kind: NameKind, name: Name) -> Result<Path, ResolveError> {
        self.namespace(kind).lookup(name)
    }

    /// Resolve an unqualified name, reporting `E2001` if it is unbound and
    /// `E2003` if it names a value whose own initializer is being lowered.
    pub fn resolve(&mut self, kind: NameKind, name: Ident, sink: &mut Diagnostics) -> Path {
        match self.lookup(kind, name.value) {
            Ok(path) => {
                if kind == NameKind::Value && self.is_initializing(path) {
                    sink.push(
                        Diagnostic::error(ErrorCode::E2003)
                            .with_message(format!(
                                "`{}` is used in its own initializer",
                                self.interner.lookup(name.value)
                            ))
                            .with_span(name.span)
                            .with_note("only a function body may refer to the binding it defines"),
                    );
                }
                path
            }
            Err(ResolveError::NotFound) => {
                sink.push(
                    Diagnostic::error(ErrorCode::E2001)
                        .with_message(format!(
                            "cannot find {} `{}` in this scope",
                            kind.describe(),
                            self.interner.lookup(name.value)
                        ))
                        .with_span(name.span),
                );
                Path::poisoned(name.value)
            }
        }
    }

    /// Resolve `a::b::name`: `a` in the module namespace, every later
    /// segment through the exports of the module before it.
    pub fn resolve_qualified(
        &mut self,
        kind: NameKind,
        name: &QualifiedName,
        sink: &mut Diagnostics,
    ) -> Path {
        let Some((first, rest)) = name.modules.split_first() else {
            return self.resolve(kind, name.name, sink);
        };
        let poisoned = Path::poisoned(name.name.value);

        let Ok(mut module) = self.lookup(NameKind::Module, first.value) else {
            sink.push(self.unknown_module(*first));
            return poisoned;
        };
        for segment in rest {
            match self.lookup_qualified(NameKind::Module, module, segment.value) {
                Some(inner) => module = inner,
                None => {
                    sink.push(self.unknown_module(*segment));
                    return poisoned;
                }
            }
        }

        if let Some(path) = self.lookup_qualified(kind, module, name.name.value) {
            return path;
        }
        let module_name = name.modules.last().map_or(Name::EMPTY, |m| m.value);
        sink.push(
            Diagnostic::error(ErrorCode::E2001)
                .with_message(format!(
                    "cannot find {} `{}` in module `{}`",
                    kind.describe(),
                    self.interner.lookup(name.name.value),
                    self.interner.lookup(module_name)
                ))
                .with_span(name.name.span),
        );
        poisoned
    }

    /// `name` among the exports of the finished module `module`.
    pub fn lookup_qualified(&self, kind: NameKind, module: Path, name: Name) -> Option<Path> {
        self.exports
            .get(&module)
            .and_then(|exports| exports.get(kind, name))
    }

    fn unknown_module(&self, name: Ident) -> Diagnostic {
        Diagnostic::error(ErrorCode::E2004)
            .with_message(format!(
                "cannot find module `{}`",
                self.interner.lookup(name.value)
            ))
            .with_span(name.span)
    }

    pub fn exports(&self, module: Path) -> Option<&ModuleExports> {
        self.exports.get(&module)
    }

    // Scopes

    pub fn enter_scope(&mut self) -> ScopeMark {
        let mark = ScopeMark {
            values: self.values.mark(),
            types: self.types.mark(),
            modules: self.modules.mark(),
            scope_depth: self.scope_depth,
            function_depth: self.function_depth,
        };
        self.scope_depth += 1;
        mark
    }

    /// A scope that is also a new function body.
    pub fn enter_function_scope(&mut self) -> ScopeMark {
        let mark = self.enter_scope();
        self.function_depth += 1;
        mark
    }

    /// Undo everything defined since `mark` was taken.
    pub fn exit_scope(&mut self, mark: ScopeMark) {
        self.values.rewind(mark.values);
        self.types.rewind(mark.types);
        self.modules.rewind(mark.modules);
        self.scope_depth = mark.scope_depth;
        self.function_depth = mark.function_depth;
    }

    pub fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let mark = self.enter_scope();
        let result = f(self);
        self.exit_scope(mark);
        result
    }

    pub fn with_function_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let mark = self.enter_function_scope();
        let result = f(self);
        self.exit_scope(mark);
        result
    }

    // Modules

    /// Define module `name` in the current scope and start minting paths
    /// inside it.
    pub fn enter_module(&mut self, name: Ident, sink: &mut Diagnostics) -> ModuleMark {
        let path = self.define(NameKind::Module, name, sink);
        let outer = self.module;
        let qualified = format!(
            "{}::{}",
            self.interner.lookup(outer),
            self.interner.lookup(name.value)
        );
        self.module = self.interner.intern(&qualified);
        let scope = self.enter_scope();
        ModuleMark { scope, path, outer }
    }

    /// Record the module's top-level bindings as its exports and leave it.
    pub fn exit_module(&mut self, mark: ModuleMark) -> Path {
        let depth = self.scope_depth;
        let exports = ModuleExports {
            values: self.values.bindings_at_depth(depth).into_iter().collect(),
            types: self.types.bindings_at_depth(depth).into_iter().collect(),
            modules: self.modules.bindings_at_depth(depth).into_iter().collect(),
        };
        tracing::debug!(
            module = self.interner.lookup(self.module),
            values = exports.values.len(),
            types = exports.types.len(),
            "module exports"
        );
        self.exit_scope(mark.scope);
        self.module = mark.outer;
        self.exports.insert(mark.path, exports);
        mark.path
    }

    pub fn with_module<T>(
        &mut self,
        name: Ident,
        sink: &mut Diagnostics,
        f: impl FnOnce(&mut Self, &mut Diagnostics) -> T,
    ) -> (Path, T) {
        let mark = self.enter_module(name, sink);
        let result = f(self, sink);
        (self.exit_module(mark), result)
    }

    // Self-reference

    pub fn begin_initializing(&mut self, paths: &[Path]) {
        self.initializing.extend(paths.iter().copied());
    }

    pub fn end_initializing(&mut self, paths: &[Path]) {
        for path in paths {
            self.initializing.remove(path);
        }
    }

    /// A use of `path` here would read it before it has a value: its
    /// initializer is running and no function body sits in between.
    fn is_initializing(&self, path: Path) -> bool {
        self.initializing.contains(&path)
            && self.values.function_depth_of(path) == Some(self.function_depth)
    }

    /// Function nesting depth a value binding was defined at.
    pub fn function_depth_of(&self, path: Path) -> Option<u32> {
        self.values.function_depth_of(path)
    }
}

#[cfg(test)]
mod tests;
