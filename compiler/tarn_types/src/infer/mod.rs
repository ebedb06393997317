//! Hindley-Milner inference over the lowered IR.
//!
//! One bottom-up walk assigns every node a type built from fresh variables
//! and unification constraints, reporting failures to the sink and moving
//! on. A second walk writes the resolved type into every slot.

mod expr;
mod pattern;
mod write_back;

use rustc_hash::FxHashMap;
use tarn_diagnostic::Diagnostics;
use tarn_ir::ir::{IrItem, IrModule};
use tarn_ir::{Path, Span, StringInterner, Type, TypeVar};

use crate::scheme::TypeScheme;
use crate::unify::InferenceContext;
use crate::universe::Universe;

/// Result of [`infer_module`]: the generalized type of every top-level
/// binding.
#[derive(Default, Debug)]
pub struct InferenceOutput {
    pub schemes: FxHashMap<Path, TypeScheme>,
}

impl InferenceOutput {
    pub fn scheme(&self, path: Path) -> Option<&TypeScheme> {
        self.schemes.get(&path)
    }
}

/// Infer and write back the type of every node in `module`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn infer_module(
    module: &mut IrModule,
    universe: &Universe,
    interner: &StringInterner,
    sink: &mut Diagnostics,
) -> InferenceOutput {
    let mut infer = Infer::new(universe, interner, sink);
    let mut top_level = Vec::new();

    for item in &mut module.items {
        match item {
            IrItem::Let { pattern, value } => {
                let bound = infer.infer_let(pattern, value);
                top_level.extend(bound);
            }
            IrItem::Expression(node) => {
                infer.infer_expr(node);
            }
        }
    }

    for item in &mut module.items {
        match item {
            IrItem::Let { pattern, value } => {
                infer.write_pattern(pattern);
                infer.write_expr(value);
            }
            IrItem::Expression(node) => infer.write_expr(node),
        }
    }

    let mut output = InferenceOutput::default();
    for path in top_level {
        if let Some(scheme) = infer.env.get(&path) {
            let resolved = TypeScheme {
                vars: scheme.vars.clone(),
                ty: infer.ctx.resolve(&scheme.ty),
            };
            output.schemes.insert(path, resolved);
        }
    }
    tracing::debug!(bindings = output.schemes.len(), "inferred module");
    output
}

pub(crate) struct Infer<'a> {
    ctx: InferenceContext<'a>,
    interner: &'a StringInterner,
    sink: &'a mut Diagnostics,
    env: FxHashMap<Path, TypeScheme>,
    /// Lexically live local bindings. Only these can hold variables that
    /// generalization must leave alone.
    locals: Vec<Path>,
}

impl<'a> Infer<'a> {
    fn new(universe: &'a Universe, interner: &'a StringInterner, sink: &'a mut Diagnostics) -> Self {
        Infer {
            ctx: InferenceContext::new(universe),
            interner,
            sink,
            env: FxHashMap::default(),
            locals: Vec::new(),
        }
    }

    fn unify_at(&mut self, span: Span, expected: &Type, found: &Type) {
        if let Err(error) = self.ctx.unify(expected, found) {
            tracing::trace!(?error, "unify failed");
            self.sink.push(error.to_diagnostic(span, self.interner));
        }
    }

    fn bind_mono(&mut self, path: Path, ty: Type) {
        self.env.insert(path, TypeScheme::monomorphic(ty));
    }

    /// Free variables of the live locals, skipping `exclude`.
    fn env_vars(&self, exclude: &[Path]) -> Vec<TypeVar> {
        let mut vars = Vec::new();
        for path in self.locals.iter().filter(|p| !exclude.contains(p)) {
            if let Some(scheme) = self.env.get(path) {
                vars.extend(self.ctx.scheme_free_vars(scheme));
            }
        }
        vars
    }

    fn generalize_bindings(&mut self, bound: &[Path]) {
        let env_vars = self.env_vars(bound);
        for path in bound {
            if let Some(scheme) = self.env.get(path) {
                let generalized = self.ctx.generalize(&scheme.ty, &env_vars);
                self.env.insert(*path, generalized);
            }
        }
    }
}
