//! Lowering from the surface AST to the typed IR.
//!
//! Lowering drives the [`Resolver`]: every name is resolved to a [`Path`]
//! at the point the walk reaches it, so scoping follows the tree exactly.
//! Along the way operators become calls to prelude functions, array
//! literals become push/append folds, literals are cooked into values,
//! multi-parameter functions curry and multi-clause functions become a
//! match over a hidden parameter.
//!
//! Lowering never fails. Problems go to the sink and the offending
//! subtree becomes an `Error` node.

mod expr;
mod literal;
mod pattern;
mod types;

pub use literal::LiteralError;

use rustc_hash::FxHashSet;
use tarn_diagnostic::Diagnostics;
use tarn_ir::ast::{ParsedModule, Statement};
use tarn_ir::ir::{IrItem, IrModule};
use tarn_ir::{Path, StringInterner, Tagged};
use tarn_resolve::Resolver;
use tarn_types::Universe;

/// Lower `module`, filling `universe` with its type definitions.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(module = resolver.interner().lookup(module.name))
)]
pub fn lower_module(
    module: &ParsedModule,
    resolver: &mut Resolver<'_>,
    universe: &mut Universe,
    sink: &mut Diagnostics,
) -> IrModule {
    for (op, path) in resolver.prelude().operators() {
        universe.register_intrinsic(path, op);
    }

    let mut lowerer = Lowerer::new(resolver, universe, sink);
    lowerer.lower_statements(&module.statements);
    let items = std::mem::take(&mut lowerer.items);
    tracing::debug!(items = items.len(), types = universe.len(), "lowered");
    IrModule {
        name: module.name,
        items,
    }
}

/// Captures collected for one function body being lowered.
struct Frame {
    /// Function depth of the body.
    depth: u32,
    captures: Vec<Path>,
    seen: FxHashSet<Path>,
}

pub(crate) struct Lowerer<'a, 'r> {
    resolver: &'a mut Resolver<'r>,
    universe: &'a mut Universe,
    sink: &'a mut Diagnostics,
    interner: &'r StringInterner,
    frames: Vec<Frame>,
    items: Vec<IrItem>,
}

impl<'a, 'r> Lowerer<'a, 'r> {
    fn new(
        resolver: &'a mut Resolver<'r>,
        universe: &'a mut Universe,
        sink: &'a mut Diagnostics,
    ) -> Self {
        let interner = resolver.interner();
        Lowerer {
            resolver,
            universe,
            sink,
            interner,
            frames: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Lower one module body (the file or a `mod` block). Type definitions
    /// are handled first so they can be used before they are written.
    fn lower_statements(&mut self, statements: &[Tagged<Statement>]) {
        self.define_types(statements);

        for statement in statements {
            match &statement.value {
                Statement::Let { pattern, value } => {
                    let mut bound = Vec::new();
                    let pattern = self.lower_pattern(pattern, &mut bound);
                    self.resolver.begin_initializing(&bound);
                    let value = self.lower_expr(value);
                    self.resolver.end_initializing(&bound);
                    self.items.push(IrItem::Let { pattern, value });
                }
                Statement::Expression(expr) => {
                    let node = self.lower_expr(expr);
                    self.items.push(IrItem::Expression(node));
                }
                Statement::TypeDefinition(_) => {}
                Statement::Module { name, statements } => {
                    let mark = self.resolver.enter_module(*name, self.sink);
                    self.lower_statements(statements);
                    let path = self.resolver.exit_module(mark);
                    tracing::trace!(module = %path.display(self.interner), "lowered nested module");
                }
            }
        }
    }

    /// Record a use of `path` by every function body between here and the
    /// one that defined it.
    fn note_use(&mut self, path: Path) {
        if path.is_poisoned() {
            return;
        }
        let Some(defined_at) = self.resolver.function_depth_of(path) else {
            return;
        };
        if defined_at == 0 || defined_at >= self.resolver.function_depth() {
            return;
        }
        for frame in self.frames.iter_mut().filter(|f| f.depth > defined_at) {
            if frame.seen.insert(path) {
                frame.captures.push(path);
            }
        }
    }
}

#[cfg(test)]
mod tests;
