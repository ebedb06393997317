//! Pattern inference. Bindings get fresh monomorphic types; the caller
//! decides whether to generalize them.

use tarn_diagnostic::{Diagnostic, ErrorCode};
use tarn_ir::ir::{Pattern, PatternKind};
use tarn_ir::{Path, Type};
use tarn_stack::ensure_sufficient_stack;

use super::expr::const_type;
use super::Infer;

impl Infer<'_> {
    pub(crate) fn infer_pattern(&mut self, pattern: &mut Pattern, bound: &mut Vec<Path>) -> Type {
        ensure_sufficient_stack(|| {
            let ty = self.infer_pattern_kind(pattern, bound);
            pattern.value.ty = ty.clone();
            ty
        })
    }

    fn infer_pattern_kind(&mut self, pattern: &mut Pattern, bound: &mut Vec<Path>) -> Type {
        let span = pattern.span;
        match &mut pattern.value.value {
            PatternKind::Wildcard | PatternKind::Error => self.ctx.fresh_var(),
            PatternKind::Const(value) => const_type(value, || self.ctx.fresh_var()),
            PatternKind::Binding(path) => {
                let ty = self.ctx.fresh_var();
                self.bind_mono(*path, ty.clone());
                bound.push(*path);
                ty
            }
            PatternKind::Tuple(items) => Type::Product(
                items
                    .iter_mut()
                    .map(|item| self.infer_pattern(item, bound))
                    .collect(),
            ),
            PatternKind::Array(array) => {
                let element = self.ctx.fresh_var();
                for item in array.elements_mut() {
                    let item_ty = self.infer_pattern(item, bound);
                    self.unify_at(item.span, &element, &item_ty);
                }
                let whole = Type::array(element);
                if let (_, Some(Some(rest)), _) = array.parts() {
                    self.bind_mono(rest, whole.clone());
                    bound.push(rest);
                }
                whole
            }
            PatternKind::Constructor { path, payload } => {
                let Some((owner, expected_payload)) = self.constructor_instance(*path) else {
                    if let Some(payload) = payload {
                        self.infer_pattern(payload, bound);
                    }
                    return self.ctx.fresh_var();
                };
                let name = self.interner.lookup(path.name);
                match (expected_payload, payload) {
                    (Some(expected), Some(payload)) => {
                        let found = self.infer_pattern(payload, bound);
                        self.unify_at(payload.span, &expected, &found);
                    }
                    (None, None) => {}
                    (Some(_), None) => self.sink.push(
                        Diagnostic::error(ErrorCode::E3001)
                            .with_message(format!("constructor `{name}` expects a payload"))
                            .with_span(span),
                    ),
                    (None, Some(payload)) => {
                        self.infer_pattern(payload, bound);
                        self.sink.push(
                            Diagnostic::error(ErrorCode::E3001)
                                .with_message(format!("constructor `{name}` takes no payload"))
                                .with_span(payload.span),
                        );
                    }
                }
                owner
            }
            PatternKind::Hinted { pattern: inner, hint } => {
                let found = self.infer_pattern(inner, bound);
                let hint = hint.clone();
                self.unify_at(span, &hint, &found);
                hint
            }
        }
    }
}
