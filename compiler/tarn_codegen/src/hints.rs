//! Call classification.
//!
//! Every call is one link of a curried chain `((h a) b) c`. The outermost
//! call of a chain decides how the whole chain is emitted, so the walk is
//! top-down and marks the inner links of a saturated operator as
//! [`CallHint::Partial`].

use rustc_hash::FxHashSet;
use tarn_ir::ir::{CallHint, IrFunction, IrItem, IrKind, IrModule, IrNode, PatternKind};
use tarn_ir::Path;
use tarn_stack::ensure_sufficient_stack;
use tarn_types::Universe;

/// A top-level `let name = fn ...`: the binding and its function.
pub(crate) fn function_binding(item: &IrItem) -> Option<(Path, &IrFunction)> {
    let IrItem::Let { pattern, value } = item else {
        return None;
    };
    let IrKind::Function(function) = &value.value.value else {
        return None;
    };
    let mut pattern = pattern;
    loop {
        match &pattern.value.value {
            PatternKind::Binding(path) => return Some((*path, function)),
            PatternKind::Hinted { pattern: inner, .. } => pattern = inner,
            _ => return None,
        }
    }
}

/// Fill in every [`CallHint::Unresolved`] in `module`. Hints already set
/// are kept.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resolve_call_hints(module: &mut IrModule, universe: &Universe) {
    let functions: FxHashSet<Path> = module
        .items
        .iter()
        .filter_map(function_binding)
        .map(|(path, _)| path)
        .collect();
    let resolver = HintResolver {
        universe,
        functions,
    };
    for item in &mut module.items {
        match item {
            IrItem::Let { value, .. } => resolver.walk(value),
            IrItem::Expression(node) => resolver.walk(node),
        }
    }
}

struct HintResolver<'u> {
    universe: &'u Universe,
    functions: FxHashSet<Path>,
}

impl HintResolver<'_> {
    fn walk(&self, node: &mut IrNode) {
        ensure_sufficient_stack(|| self.walk_inner(node));
    }

    fn walk_inner(&self, node: &mut IrNode) {
        let unresolved = matches!(
            node.value.value,
            IrKind::Call {
                hint: CallHint::Unresolved,
                ..
            }
        );
        if unresolved {
            let hint = self.classify(node);
            if let CallHint::Intrinsic(_) = hint {
                mark_partial(node);
            }
            if let IrKind::Call { hint: slot, .. } = &mut node.value.value {
                *slot = hint;
            }
        }

        match &mut node.value.value {
            IrKind::Const(_) | IrKind::Identifier(_) | IrKind::Error => {}
            IrKind::Let { value, body, .. } => {
                self.walk(value);
                self.walk(body);
            }
            IrKind::Tuple(items) => {
                for item in items {
                    self.walk(item);
                }
            }
            IrKind::Record { fields, .. } => {
                for (_, value) in fields {
                    self.walk(value);
                }
            }
            IrKind::Project { value, .. } => self.walk(value),
            IrKind::Function(function) => self.walk(&mut function.body),
            IrKind::Call {
                callee, argument, ..
            } => {
                self.walk(callee);
                self.walk(argument);
            }
            IrKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.walk(condition);
                self.walk(then_branch);
                self.walk(else_branch);
            }
            IrKind::Match {
                scrutinee,
                branches,
                ..
            } => {
                self.walk(scrutinee);
                for branch in branches {
                    self.walk(branch);
                }
            }
        }
    }

    /// Hint for the outermost call of the chain rooted at `node`.
    fn classify(&self, node: &IrNode) -> CallHint {
        let (head, applied) = chain_head(node);
        let IrKind::Identifier(path) = &head.value.value else {
            return CallHint::Indirect;
        };
        if let Some(op) = self.universe.intrinsic(*path) {
            if applied == op.arity() {
                return CallHint::Intrinsic(op);
            }
            return CallHint::Indirect;
        }
        if let Some(info) = self.universe.constructor(*path) {
            if info.payload.is_some() && applied == 1 {
                return CallHint::Constructor { tag: info.tag };
            }
            return CallHint::Indirect;
        }
        if applied == 1 && self.functions.contains(path) {
            return CallHint::Direct(*path);
        }
        CallHint::Indirect
    }
}

/// The non-call head of a chain and the number of calls above it.
pub(crate) fn chain_head(node: &IrNode) -> (&IrNode, usize) {
    let mut current = node;
    let mut applied = 0;
    while let IrKind::Call { callee, .. } = &current.value.value {
        applied += 1;
        current = callee;
    }
    (current, applied)
}

fn mark_partial(node: &mut IrNode) {
    let IrKind::Call { callee, .. } = &mut node.value.value else {
        return;
    };
    let mut current: &mut IrNode = callee;
    while let IrKind::Call { callee, hint, .. } = &mut current.value.value {
        *hint = CallHint::Partial;
        current = callee;
    }
}
